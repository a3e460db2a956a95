//! Error types for locating and reading embedded archives

use std::io;
use thiserror::Error;

/// Errors returned by the embedded-archive reader and the argument injector.
///
/// Only [`Error::NotFound`] is meant to be handled: it means the host file
/// carries no usable archive. Everything else should abort the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// No recognizable footer at the end of the host file.
    ///
    /// Also reported when the footer carries a comment, or when the sizes it
    /// declares do not fit inside the host file.
    #[error("cannot find zip footer; file does not have embedded zip or zip file has comment")]
    NotFound,

    /// Open, seek or read failure
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The archive reader rejected the embedded data
    #[error("invalid embedded archive: {0:#}")]
    Format(anyhow::Error),

    /// The arguments entry could not be decoded
    #[error("invalid arguments file: {0}")]
    Csv(#[source] csv::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<io::Error>() {
            Ok(io) => Error::Io(io),
            Err(err) => Error::Format(err),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Error::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            other => Error::Io(io::Error::other(format!("{other:?}"))),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn anyhow_wrapping_io_becomes_io() {
        let err: anyhow::Error = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(Error::from(err), Error::Io(e) if e.kind() == io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn other_anyhow_errors_are_format_errors() {
        let err = anyhow::anyhow!("Invalid Local File Header");
        let err = Error::from(err);
        assert!(matches!(err, Error::Format(_)));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "invalid embedded archive: Invalid Local File Header");
    }

    #[test]
    fn context_is_kept_for_format_errors() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("bad header")).context("reading a.txt");
        let err = Error::from(err.unwrap_err());
        assert_eq!(err.to_string(), "invalid embedded archive: reading a.txt: bad header");
    }

    #[test]
    fn csv_io_failures_become_io() {
        let err = csv::Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(matches!(Error::from(err), Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn csv_decode_failures_stay_csv() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&b"a,b\nc\n"[..]);
        let err = reader.records().find_map(|r| r.err()).unwrap();
        assert!(matches!(Error::from(err), Error::Csv(_)));
    }

    #[test]
    fn not_found_message() {
        assert!(Error::NotFound.is_not_found());
        assert!(Error::NotFound.to_string().starts_with("cannot find zip footer"));
    }
}
