//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! All offsets stored in the archive are relative to the first byte of the
//! reader, so an archive appended to another file must be handed in through
//! a [`BoundedReader`](crate::io::BoundedReader).

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Create a new parser for the given reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - A shared reference to a reader implementing [`ReadAt`]
    ///
    /// # Returns
    ///
    /// A new parser instance ready to read the archive.
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    ///
    /// # Errors
    ///
    /// Returns an error if no valid EOCD is found or the reader fails.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no comment, record sits at the very end
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = [0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            let eocd = EndOfCentralDirectory::decode(&buf);
            if eocd.signature == EndOfCentralDirectory::MAGIC && eocd.comment_len == 0 {
                return Ok((eocd, offset));
            }
        }

        // Otherwise the record is followed by a comment of up to 64 KiB
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        if buf.len() < EndOfCentralDirectory::SIZE {
            bail!("Not a valid ZIP file");
        }

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for exactly the remaining bytes
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&buf[i..])?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// List all files in the ZIP archive.
    ///
    /// Reads the EOCD first, then fetches and parses the entire
    /// Central Directory in a single read.
    ///
    /// # Returns
    ///
    /// All entries, in Central Directory order.
    ///
    /// # Errors
    ///
    /// Returns an error for multi-disk archives, for a Central Directory
    /// that does not fit before the EOCD, or for a malformed or truncated
    /// directory record. Reader failures keep their [`std::io::Error`].
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.disk_number != 0 || eocd.disk_with_cd != 0 {
            bail!("Multi-disk archives are not supported");
        }

        let cd_offset = eocd.cd_offset as u64;
        let cd_size = eocd.cd_size as u64;
        let total_entries = eocd.total_entries as u64;

        if cd_offset + cd_size > eocd_offset {
            bail!(
                "Central Directory ({} bytes at {}) overlaps the end record at {}",
                cd_size,
                cd_offset,
                eocd_offset
            );
        }
        if total_entries * CDFH_MIN_SIZE as u64 > cd_size {
            bail!(
                "Central Directory of {} bytes cannot hold {} entries",
                cd_size,
                total_entries
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader
            .read_exact_at(cd_offset, &mut cd_data)
            .await
            .context("Failed to read Central Directory")?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(&cd_data);

        for _ in 0..total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    ///
    /// # Arguments
    ///
    /// * `cursor` - A cursor positioned at the start of a CDFH
    ///
    /// The directory is already in memory, so running out of bytes means
    /// the record is malformed. That is checked before any read, and no
    /// cursor error reaches the caller.
    fn parse_cdfh(&self, cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipFileEntry> {
        let remaining = cursor.get_ref().len() as u64 - cursor.position();
        if remaining < CDFH_MIN_SIZE as u64 {
            bail!(
                "Truncated Central Directory entry: {} bytes left, need {}",
                remaining,
                CDFH_MIN_SIZE
            );
        }

        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let name_end = cursor.position() + file_name_length as u64;
        if name_end > cursor.get_ref().len() as u64 {
            bail!(
                "Truncated Central Directory entry: name of {} bytes runs past the directory",
                file_name_length
            );
        }
        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy: non-UTF8 names still list, they just never match exactly
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        let is_directory = file_name.ends_with('/');

        // Skip extra field and comment; neither is used
        let next = cursor.position() + extra_field_length as u64 + file_comment_length as u64;
        if next > cursor.get_ref().len() as u64 {
            bail!("Truncated Central Directory entry: {}", file_name);
        }
        cursor.set_position(next);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header (LFH) has variable-length fields (filename,
    /// extra field) that may differ from the Central Directory entry,
    /// so the LFH itself is read.
    ///
    /// # Arguments
    ///
    /// * `entry` - The file entry from [`list_files()`](Self::list_files)
    ///
    /// # Returns
    ///
    /// The byte offset where the compressed file data begins.
    ///
    /// # Errors
    ///
    /// Returns an error if the LFH cannot be read or is invalid.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await
            .with_context(|| format!("Failed to read Local File Header of {}", entry.file_name))?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        let data_offset =
            entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;

        Ok(data_offset)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::testutil::{TestEntry, build_zip};

    fn parser(bytes: Vec<u8>) -> ZipParser<MemoryReader> {
        ZipParser::new(Arc::new(MemoryReader::new(bytes)))
    }

    #[tokio::test]
    async fn lists_entries_in_directory_order() {
        let zip = build_zip(
            &[
                TestEntry::stored("arguments.txt", b"-v"),
                TestEntry::stored("conf/", b""),
                TestEntry::deflated("conf/app.toml", b"x = 1\n"),
            ],
            b"",
        );
        let entries = parser(zip).list_files().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["arguments.txt", "conf/", "conf/app.toml"]);
        assert!(entries[1].is_directory);
        assert_eq!(entries[2].compression_method, CompressionMethod::Deflate);
        assert_eq!(entries[2].uncompressed_size, 6);
    }

    #[tokio::test]
    async fn finds_eocd_behind_a_comment() {
        let zip = build_zip(&[TestEntry::stored("a", b"1")], b"hello comment");
        let len = zip.len() as u64;
        let p = parser(zip);

        let (eocd, offset) = p.find_eocd().await.unwrap();
        assert_eq!(eocd.comment_len, 13);
        assert_eq!(offset, len - 22 - 13);
        assert_eq!(p.list_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_archive_has_no_entries() {
        let zip = build_zip(&[], b"");
        assert_eq!(zip.len(), 22);
        assert!(parser(zip).list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_is_not_a_zip() {
        assert!(parser(vec![7u8; 100]).find_eocd().await.is_err());
        assert!(parser(vec![1u8; 5]).find_eocd().await.is_err());
    }

    #[tokio::test]
    async fn data_offset_skips_local_header() {
        let zip = build_zip(&[TestEntry::stored("name.bin", b"payload")], b"");
        let p = parser(zip);
        let entries = p.list_files().await.unwrap();
        let offset = p.get_data_offset(&entries[0]).await.unwrap();
        assert_eq!(offset, 30 + "name.bin".len() as u64);
    }
}
