//! Reading a ZIP archive appended to the end of a host file.
//!
//! The usual way to ship data inside an executable is to append a ZIP to it:
//!
//! ```text
//! cat app data.zip > app-with-data
//! ```
//!
//! The result is not a well-formed ZIP, since every offset recorded in the
//! archive is relative to the start of `data.zip` rather than to the start
//! of the file. [`EmbeddedArchive`] finds where the archive begins and
//! gives the archive reader a view that starts there.

mod footer;

pub use footer::{ArchiveSpan, locate};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::io::{BoundedReader, LocalFileReader, ReadAt};
use crate::zip::{ZipExtractor, ZipFileEntry};

/// Something that can open the host file an archive may be appended to.
///
/// Any `Fn() -> io::Result<R>` closure is a host image, which lets tests
/// substitute in-memory buffers for the running executable.
pub trait HostImage {
    type Reader: ReadAt;

    fn open(&self) -> io::Result<Self::Reader>;
}

/// The executable image of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentExe;

impl HostImage for CurrentExe {
    type Reader = LocalFileReader;

    fn open(&self) -> io::Result<LocalFileReader> {
        LocalFileReader::new(&std::env::current_exe()?)
    }
}

/// A host file at a fixed path
#[derive(Debug, Clone)]
pub struct HostPath(pub PathBuf);

impl HostImage for HostPath {
    type Reader = LocalFileReader;

    fn open(&self) -> io::Result<LocalFileReader> {
        LocalFileReader::new(&self.0)
    }
}

impl<F, R> HostImage for F
where
    F: Fn() -> io::Result<R>,
    R: ReadAt,
{
    type Reader = R;

    fn open(&self) -> io::Result<R> {
        self()
    }
}

/// An open embedded archive.
///
/// Owns the host reader; dropping the archive (or calling
/// [`close`](Self::close)) releases the host file.
pub struct EmbeddedArchive<R: ReadAt> {
    span: ArchiveSpan,
    entries: Vec<ZipFileEntry>,
    zip: ZipExtractor<BoundedReader<R>>,
}

impl EmbeddedArchive<LocalFileReader> {
    /// Open the archive appended to the running executable.
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if there is none.
    pub async fn open() -> Result<Self> {
        Self::open_with(&CurrentExe).await
    }
}

impl<R: ReadAt> EmbeddedArchive<R> {
    /// Open the archive appended to the file provided by `host`.
    ///
    /// The host is opened exactly once.
    ///
    /// # Errors
    ///
    /// A host that cannot be opened is an [`Error::Io`](crate::Error::Io).
    /// Otherwise the same as [`from_reader`](Self::from_reader).
    pub async fn open_with<H>(host: &H) -> Result<Self>
    where
        H: HostImage<Reader = R> + ?Sized,
    {
        let reader = host.open()?;
        Self::from_reader(reader).await
    }

    /// Locate the archive at the end of `reader` and parse its directory.
    ///
    /// # Arguments
    ///
    /// * `reader` - The host file, owned by the returned archive
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`](crate::Error::NotFound) - no usable footer
    /// * [`Error::Io`](crate::Error::Io) - the host could not be read
    /// * [`Error::Format`](crate::Error::Format) - the archive reader rejected
    ///   the directory
    ///
    /// `reader` is dropped on every error path.
    pub async fn from_reader(reader: R) -> Result<Self> {
        let total_len = reader.size();
        let span = locate(&reader, total_len).await?;

        let view = BoundedReader::new(Arc::new(reader), span.start, span.size)?;
        let zip = ZipExtractor::new(Arc::new(view));
        let entries = zip.list_files().await?;

        debug!(
            start = span.start,
            size = span.size,
            entries = entries.len(),
            "opened embedded archive"
        );

        Ok(Self { span, entries, zip })
    }

    /// Where the archive sits inside the host file
    pub fn span(&self) -> ArchiveSpan {
        self.span
    }

    /// Every entry of the central directory, in directory order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// The entry whose full name is exactly `name`
    pub fn find_entry(&self, name: &str) -> Option<&ZipFileEntry> {
        self.entries.iter().find(|e| e.file_name == name)
    }

    /// Read and decompress an entry
    pub async fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        Ok(self.zip.extract_to_memory(entry).await?)
    }

    /// The archive reader over the bounded view
    pub fn extractor(&self) -> &ZipExtractor<BoundedReader<R>> {
        &self.zip
    }

    /// Release the host file
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::io::MemoryReader;
    use crate::zip::testutil::{TestEntry, build_zip};
    use std::cell::Cell;

    fn appended(prefix: &[u8], zip: &[u8]) -> Vec<u8> {
        let mut host = prefix.to_vec();
        host.extend_from_slice(zip);
        host
    }

    #[tokio::test]
    async fn empty_archive_after_100_bytes() {
        let host = appended(&[0xCC; 100], &build_zip(&[], b""));
        let archive = EmbeddedArchive::from_reader(MemoryReader::new(host))
            .await
            .unwrap();
        assert_eq!(archive.span().start, 100);
        assert_eq!(archive.span().size, 22);
        assert!(archive.entries().is_empty());
    }

    #[tokio::test]
    async fn reads_entries_through_the_view() {
        let zip = build_zip(
            &[
                TestEntry::stored("arguments.txt", b"-a -b"),
                TestEntry::deflated("data/blob", &[9u8; 500]),
            ],
            b"",
        );
        // The host prefix looks like a zip of its own
        let prefix = build_zip(&[TestEntry::stored("decoy", b"no")], b"");
        let host = appended(&prefix, &zip);

        let archive = EmbeddedArchive::from_reader(MemoryReader::new(host))
            .await
            .unwrap();
        assert_eq!(archive.span().start, prefix.len() as u64);
        assert!(archive.find_entry("decoy").is_none());

        let args = archive.find_entry("arguments.txt").unwrap();
        assert_eq!(archive.read_entry(args).await.unwrap(), b"-a -b");
        let blob = archive.find_entry("data/blob").unwrap().clone();
        assert_eq!(archive.read_entry(&blob).await.unwrap(), vec![9u8; 500]);
        archive.close();
    }

    #[tokio::test]
    async fn hosts_without_archive_are_not_found() {
        for len in [0usize, 1, 21, 22, 23, 4096] {
            let err = EmbeddedArchive::from_reader(MemoryReader::new(vec![0u8; len]))
                .await
                .err()
                .unwrap();
            assert!(err.is_not_found(), "len {len}: {err}");
        }
    }

    #[tokio::test]
    async fn archive_with_comment_is_not_found() {
        let host = appended(b"#!/bin/sh\n", &build_zip(&[TestEntry::stored("a", b"")], b"note"));
        let err = EmbeddedArchive::from_reader(MemoryReader::new(host))
            .await
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn broken_directory_is_a_format_error() {
        // A footer claiming one 46-byte directory entry filled with zeros
        let mut zip = vec![0u8; 46];
        let mut eocd = build_zip(&[], b"");
        eocd[8] = 1;
        eocd[10] = 1;
        eocd[12] = 46;
        zip.extend_from_slice(&eocd);

        let err = EmbeddedArchive::from_reader(MemoryReader::new(zip))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Format(_)), "{err}");
    }

    #[tokio::test]
    async fn truncated_directory_name_is_a_format_error() {
        // One directory header whose 10-byte name runs past the directory
        let mut zip = vec![0u8; 46];
        zip[..4].copy_from_slice(b"PK\x01\x02");
        zip[28] = 10;
        let mut eocd = build_zip(&[], b"");
        eocd[8] = 1;
        eocd[10] = 1;
        eocd[12] = 46;
        zip.extend_from_slice(&eocd);

        let err = EmbeddedArchive::from_reader(MemoryReader::new(zip))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Format(_)), "{err:?}");
        assert!(err.to_string().contains("Truncated Central Directory entry"), "{err}");
    }

    #[tokio::test]
    async fn host_open_failure_is_an_io_error() {
        let host = || -> io::Result<MemoryReader> { Err(io::ErrorKind::PermissionDenied.into()) };
        let err = EmbeddedArchive::open_with(&host).await.err().unwrap();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
    }

    #[tokio::test]
    async fn host_is_opened_once() {
        let opens = Cell::new(0);
        let bytes = build_zip(&[], b"");
        let host = || -> io::Result<MemoryReader> {
            opens.set(opens.get() + 1);
            Ok(MemoryReader::new(bytes.clone()))
        };
        EmbeddedArchive::open_with(&host).await.unwrap();
        assert_eq!(opens.get(), 1);
    }
}
