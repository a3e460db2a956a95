//! Minimal archive writer for tests.
//!
//! Shared with the integration tests through `tests/common`, so it only
//! depends on external crates.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub struct TestEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub deflate: bool,
}

impl<'a> TestEntry<'a> {
    pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self { name, data, deflate: false }
    }

    pub fn deflated(name: &'a str, data: &'a [u8]) -> Self {
        Self { name, data, deflate: true }
    }
}

/// Build a single-disk archive whose offsets start at 0.
pub fn build_zip(entries: &[TestEntry<'_>], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut cd = Vec::new();

    for entry in entries {
        let mut crc = flate2::Crc::new();
        crc.update(entry.data);
        let (method, payload) = if entry.deflate {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(entry.data).unwrap();
            (8u16, enc.finish().unwrap())
        } else {
            (0u16, entry.data.to_vec())
        };
        let lfh_offset = out.len() as u32;

        // version, flags, method, time, date
        out.extend_from_slice(b"PK\x03\x04");
        for v in [20u16, 0, method, 0, 0x21] {
            out.write_u16::<LittleEndian>(v).unwrap();
        }
        for v in [crc.sum(), payload.len() as u32, entry.data.len() as u32] {
            out.write_u32::<LittleEndian>(v).unwrap();
        }
        out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&payload);

        // made by, needed, flags, method, time, date
        cd.extend_from_slice(b"PK\x01\x02");
        for v in [20u16, 20, 0, method, 0, 0x21] {
            cd.write_u16::<LittleEndian>(v).unwrap();
        }
        for v in [crc.sum(), payload.len() as u32, entry.data.len() as u32] {
            cd.write_u32::<LittleEndian>(v).unwrap();
        }
        // name, extra, comment, disk start, internal attrs
        for v in [entry.name.len() as u16, 0, 0, 0, 0] {
            cd.write_u16::<LittleEndian>(v).unwrap();
        }
        cd.write_u32::<LittleEndian>(0).unwrap();
        cd.write_u32::<LittleEndian>(lfh_offset).unwrap();
        cd.extend_from_slice(entry.name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&cd);
    out.extend_from_slice(b"PK\x05\x06");
    for v in [0u16, 0, entries.len() as u16, entries.len() as u16] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }
    out.write_u32::<LittleEndian>(cd.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
    out.extend_from_slice(comment);
    out
}
