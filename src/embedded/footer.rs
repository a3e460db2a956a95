//! Locating an archive appended to a host file.
//!
//! A ZIP written without a comment ends in a 22-byte End of Central
//! Directory record. Its `cd_offset` and `cd_size` fields are relative to
//! the start of the archive, so when the archive is appended to a host
//! file the archive length is `22 + cd_size + cd_offset`, and the archive
//! begins that many bytes before the end of the host file.

use tracing::trace;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::zip::EndOfCentralDirectory;

/// Byte range of an embedded archive within its host file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSpan {
    pub footer: EndOfCentralDirectory,
    /// Offset of the first archive byte in the host file
    pub start: u64,
    /// Archive length, footer included
    pub size: u64,
}

impl ArchiveSpan {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// Read and validate the trailing footer of a host file, and compute where
/// the archive it closes begins.
///
/// # Arguments
///
/// * `reader` - The host file
/// * `total_len` - Length of the host file in bytes
///
/// # Returns
///
/// The decoded footer together with the archive's start and size.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when the file is shorter than the footer,
/// when the signature does not match, when the footer carries a comment,
/// or when the declared archive does not fit in the file. Read failures are
/// returned as [`Error::Io`].
pub async fn locate<R: ReadAt + ?Sized>(reader: &R, total_len: u64) -> Result<ArchiveSpan> {
    const FOOTER_SIZE: u64 = EndOfCentralDirectory::SIZE as u64;

    if total_len < FOOTER_SIZE {
        return Err(Error::NotFound);
    }

    let mut buf = [0u8; EndOfCentralDirectory::SIZE];
    reader.read_exact_at(total_len - FOOTER_SIZE, &mut buf).await?;
    let footer = EndOfCentralDirectory::decode(&buf);
    trace!(?footer, "decoded trailing footer");

    if footer.signature != EndOfCentralDirectory::MAGIC || footer.comment_len != 0 {
        return Err(Error::NotFound);
    }

    let size = footer.archive_size();
    if size > total_len {
        return Err(Error::NotFound);
    }

    Ok(ArchiveSpan {
        footer,
        start: total_len - size,
        size,
    })
}
