use byteorder::{ByteOrder, LittleEndian};

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes without comment
///
/// Wire layout, little-endian:
///
/// | offset | size | field          |
/// |--------|------|----------------|
/// | 0      | 4    | signature      |
/// | 4      | 2    | disk_number    |
/// | 6      | 2    | disk_with_cd   |
/// | 8      | 2    | disk_entries   |
/// | 10     | 2    | total_entries  |
/// | 12     | 4    | cd_size        |
/// | 16     | 4    | cd_offset      |
/// | 20     | 2    | comment_len    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub signature: u32,
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const MAGIC: u32 = 0x0605_4b50;
    pub const SIZE: usize = 22;

    /// Decode the fixed-size record field by field. No validation.
    pub fn decode(buf: &[u8; Self::SIZE]) -> Self {
        Self {
            signature: LittleEndian::read_u32(&buf[0..4]),
            disk_number: LittleEndian::read_u16(&buf[4..6]),
            disk_with_cd: LittleEndian::read_u16(&buf[6..8]),
            disk_entries: LittleEndian::read_u16(&buf[8..10]),
            total_entries: LittleEndian::read_u16(&buf[10..12]),
            cd_size: LittleEndian::read_u32(&buf[12..16]),
            cd_offset: LittleEndian::read_u32(&buf[16..20]),
            comment_len: LittleEndian::read_u16(&buf[20..22]),
        }
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.signature);
        LittleEndian::write_u16(&mut buf[4..6], self.disk_number);
        LittleEndian::write_u16(&mut buf[6..8], self.disk_with_cd);
        LittleEndian::write_u16(&mut buf[8..10], self.disk_entries);
        LittleEndian::write_u16(&mut buf[10..12], self.total_entries);
        LittleEndian::write_u32(&mut buf[12..16], self.cd_size);
        LittleEndian::write_u32(&mut buf[16..20], self.cd_offset);
        LittleEndian::write_u16(&mut buf[20..22], self.comment_len);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let Some(record) = data.get(..Self::SIZE) else {
            bail!("Invalid End of Central Directory");
        };
        let mut buf = [0u8; Self::SIZE];
        buf.copy_from_slice(record);

        let eocd = Self::decode(&buf);
        if eocd.signature != Self::MAGIC {
            bail!("Invalid End of Central Directory");
        }
        Ok(eocd)
    }

    /// Length of an archive that ends with this record and has no comment:
    /// everything before the central directory, the directory, and the record.
    pub fn archive_size(&self) -> u64 {
        Self::SIZE as u64 + self.cd_size as u64 + self.cd_offset as u64
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
