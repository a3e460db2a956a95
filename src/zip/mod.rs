//! ZIP archive parsing and extraction.
//!
//! This is the archive reader the embedded-archive façade hands its bounded
//! view to. It works over any [`ReadAt`](crate::io::ReadAt) source, so it
//! reads plain ZIP files just as well.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: High-level extraction API
//!
//! ## Supported Features
//!
//! - Standard single-disk ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - STORED and DEFLATE methods, with CRC-32 verification
//!
//! ## Limitations
//!
//! - No ZIP64
//! - No encryption support
//! - No multi-disk archive support

mod extractor;
mod parser;
mod structures;
#[cfg(test)]
pub(crate) mod testutil;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
