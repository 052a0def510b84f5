//src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a profile run. Nothing here is recoverable per row.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Missing or invalid command line input, detected before reading the profile.
    #[error("{0}")]
    Configuration(String),

    /// File could not be opened or created.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read/write failure on an already open stream.
    #[error(transparent)]
    Stream(#[from] io::Error),

    #[error(
        "The release is not specified in the header or does not correspond to \
         mpa_vJun23_CHOCOPhlAnSGB_202307 or mpa_vOct22_CHOCOPhlAnSGB_202212 (found: {})",
        found.as_deref().unwrap_or("none")
    )]
    UnrecognizedRelease { found: Option<String> },

    #[error("{key} not found in {table}")]
    LookupMiss { key: String, table: String },

    /// Rank total (plus unclassified offset) is zero, so percentages are undefined.
    #[error("total abundance at rank {rank} is zero in column {column}")]
    DegenerateNormalization { rank: String, column: usize },

    #[error("expected {expected} abundance column(s), found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, ProfileError>;

impl ProfileError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProfileError::Io {
            path: path.into(),
            source,
        }
    }
}
