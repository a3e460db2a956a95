use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::io::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound on the buffer reserved up front for an inflated entry
const MAX_PREALLOC: u64 = 64 * 1024;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    /// Create an extractor over `reader`, whose offset 0 is the first byte
    /// of the archive.
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Find an entry by its exact, case-sensitive name.
    ///
    /// Names are full archive paths, so `dir/a.txt` never matches `a.txt`.
    pub async fn find_entry(&self, name: &str) -> Result<Option<ZipFileEntry>> {
        Ok(self
            .list_files()
            .await?
            .into_iter()
            .find(|e| e.file_name == name))
    }

    /// Extract file data to memory.
    ///
    /// STORED entries are copied and DEFLATE entries are inflated. The result
    /// is checked against the declared size and CRC-32.
    ///
    /// # Arguments
    ///
    /// * `entry` - The file entry to extract
    ///
    /// # Returns
    ///
    /// The uncompressed contents of the entry.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported compression method, a corrupt
    /// DEFLATE stream, or a size or CRC mismatch. Inflation stops one byte
    /// past the declared size.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.get_data_offset(entry).await?;
        if data_offset + entry.compressed_size > self.parser.reader().size() {
            bail!(
                "Data of {} ({} bytes at {}) runs past the end of the archive",
                entry.file_name,
                entry.compressed_size,
                data_offset
            );
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await
            .with_context(|| format!("Failed to read data of {}", entry.file_name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect a mismatch
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size + 1)
                    .read_to_end(&mut out)
                    .map_err(|e| anyhow!("Failed to inflate {}: {}", entry.file_name, e))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method: {} (only STORED and DEFLATE are supported)",
                    method
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = flate2::Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }

    /// Extract file to disk, creating parent directories as needed.
    ///
    /// # Arguments
    ///
    /// * `entry` - The file entry to extract
    /// * `output_path` - Destination path, used as given
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;

        Ok(())
    }

    /// Extract file to stdout
    pub async fn extract_to_stdout(&self, entry: &ZipFileEntry) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;

        Ok(())
    }
}
