//! # embedzip
//!
//! Read a ZIP archive that has been appended to the end of another file,
//! typically the running executable, and load default command-line
//! arguments from it.
//!
//! An archive appended to a host file is not a valid ZIP on its own: all of
//! its offsets are relative to where the archive starts, not to the start
//! of the file. This crate reads the trailing End of Central Directory
//! record, derives the archive's byte range from it, and hands the archive
//! reader a window over exactly that range.
//!
//! Only archives without a trailing comment are recognized.
//!
//! ## Features
//!
//! - Locate and read an archive appended to any file or to the running executable
//! - List and extract STORED and DEFLATE entries
//! - Prepend arguments from an embedded `arguments.txt` to the process arguments
//!
//! ## Example
//!
//! ```no_run
//! use embedzip::{EmbeddedArchive, Error};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     // Arguments after injection; install them however the program likes
//!     let args = embedzip::load_embedded_arguments().await?;
//!     println!("{:?}", args);
//!
//!     match EmbeddedArchive::open().await {
//!         Ok(archive) => {
//!             for entry in archive.entries() {
//!                 println!("{}", entry.file_name);
//!             }
//!         }
//!         Err(Error::NotFound) => println!("nothing embedded"),
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod cli;
pub mod embedded;
pub mod error;
pub mod io;
pub mod zip;

pub use args::{ARGUMENTS_FILE_NAME, ArgumentInjector, load_embedded_arguments};
pub use cli::Cli;
pub use embedded::{ArchiveSpan, CurrentExe, EmbeddedArchive, HostImage, HostPath};
pub use error::{Error, Result};
pub use io::{BoundedReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ZipExtractor, ZipFileEntry};
