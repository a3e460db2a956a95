//! Default command-line arguments shipped inside the executable.
//!
//! An `arguments.txt` at the root of the embedded archive holds extra
//! arguments, separated by single spaces. Fields may be double-quoted to
//! carry spaces. Every line must hold as many fields as the first one. All
//! lines are joined in order and the result is inserted right after the
//! program name:
//!
//! ```text
//! arguments.txt:  --level 3
//!                 --name "two words"
//! invoked as:     prog input.txt
//! becomes:        prog --level 3 --name "two words" input.txt
//! ```

use std::ffi::OsString;

use tracing::debug;

use crate::embedded::{CurrentExe, EmbeddedArchive, HostImage};
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// Name of the entry holding the default arguments
pub const ARGUMENTS_FILE_NAME: &str = "arguments.txt";

/// Reads default arguments from an embedded archive and splices them into
/// an argument list.
#[derive(Debug, Clone)]
pub struct ArgumentInjector {
    entry_name: String,
    delimiter: u8,
}

impl Default for ArgumentInjector {
    fn default() -> Self {
        Self {
            entry_name: ARGUMENTS_FILE_NAME.to_string(),
            delimiter: b' ',
        }
    }
}

impl ArgumentInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different entry name. Matching is exact and case-sensitive.
    pub fn with_entry_name(mut self, name: impl Into<String>) -> Self {
        self.entry_name = name.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode the arguments entry of `archive`, or `None` if it has none.
    pub async fn read_tokens<R: ReadAt>(
        &self,
        archive: &EmbeddedArchive<R>,
    ) -> Result<Option<Vec<String>>> {
        let Some(entry) = archive.find_entry(&self.entry_name) else {
            debug!(entry = %self.entry_name, "no arguments entry in embedded archive");
            return Ok(None);
        };

        let data = archive.read_entry(entry).await?;
        let tokens = decode_tokens(&data, self.delimiter)?;
        debug!(entry = %self.entry_name, count = tokens.len(), "loaded embedded arguments");
        Ok(Some(tokens))
    }

    /// Return `original` with the embedded arguments of `host` spliced in.
    ///
    /// # Arguments
    ///
    /// * `host` - Provides the file the archive is appended to
    /// * `original` - The argument list, program name first
    ///
    /// # Returns
    ///
    /// `original` with the decoded tokens inserted after its first element.
    /// A host without an embedded archive, or an archive without the
    /// arguments entry, leaves `original` untouched.
    ///
    /// # Errors
    ///
    /// Any failure other than a missing archive is returned: [`Error::Io`]
    /// when the host cannot be opened or read, [`Error::Format`] when the
    /// archive is malformed, and [`Error::Csv`] when the entry cannot be
    /// decoded.
    pub async fn inject<H, A>(&self, host: &H, original: Vec<A>) -> Result<Vec<A>>
    where
        H: HostImage + ?Sized,
        A: From<String>,
    {
        let archive = match EmbeddedArchive::open_with(host).await {
            Ok(archive) => archive,
            Err(Error::NotFound) => {
                debug!("no embedded archive");
                return Ok(original);
            }
            Err(err) => return Err(err),
        };

        let tokens = self.read_tokens(&archive).await?;
        archive.close();

        Ok(match tokens {
            Some(tokens) => splice_arguments(original, tokens),
            None => original,
        })
    }
}

/// Split delimited text into a flat token list.
///
/// Every line is a record; fields of all records are concatenated in order.
/// Fields follow CSV quoting.
///
/// # Errors
///
/// Returns [`Error::Csv`] for malformed quoting, invalid UTF-8, or a record
/// whose field count differs from the first record.
pub fn decode_tokens(data: &[u8], delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(data);

    let mut tokens = Vec::new();
    for record in reader.records() {
        let record = record?;
        tokens.extend(record.iter().map(str::to_owned));
    }
    Ok(tokens)
}

/// Insert `tokens` after the program name in `original`.
///
/// An empty `original` has no program name, so the result is just `tokens`.
pub fn splice_arguments<A: From<String>>(original: Vec<A>, tokens: Vec<String>) -> Vec<A> {
    let mut original = original.into_iter();
    let mut out = Vec::with_capacity(original.len() + tokens.len());
    out.extend(original.next());
    out.extend(tokens.into_iter().map(A::from));
    out.extend(original);
    out
}

/// The process arguments with the running executable's embedded arguments
/// spliced in. The caller decides what to do with the result.
pub async fn load_embedded_arguments() -> Result<Vec<OsString>> {
    ArgumentInjector::default()
        .inject(&CurrentExe, std::env::args_os().collect())
        .await
}
