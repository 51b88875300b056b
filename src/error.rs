//! Crate-wide error type.
//!
//! One enum covering the error kinds from the design: a mandatory file
//! missing at startup, a corrupt on-disk record, and the I/O failures that
//! bubble up while building or reading an index generation. Query-time
//! conditions that retrieval treats as *results* rather than
//! failures (an unknown query term, a transient read failure on a single
//! posting fetch) are never represented here — see `query.rs`, which turns
//! both into an empty result set instead of an `Err`.

use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A mandatory file is absent. Fatal for builders; fatal at query-engine
    /// startup for lexicon/lengths/barrel-dir/metadata.
    MissingInput { path: PathBuf },
    /// A record was short, had an impossible length, or was otherwise
    /// malformed. The caller decides whether to skip it or abort.
    CorruptRecord { what: &'static str, detail: String },
    /// Wraps an underlying I/O failure (open/seek/read/write).
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingInput { path } => {
                write!(f, "missing mandatory input file: {}", path.display())
            }
            Error::CorruptRecord { what, detail } => {
                write!(f, "corrupt {what}: {detail}")
            }
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl Error {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Error::MissingInput { path: path.into() }
    }

    pub fn corrupt(what: &'static str, detail: impl Into<String>) -> Self {
        Error::CorruptRecord {
            what,
            detail: detail.into(),
        }
    }
}
