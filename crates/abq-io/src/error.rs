//! Error types for abq-io

use abq_inp::{InpError, ParseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The emit pass saw different geometry than the count pass planned for.
    #[error("{block} block size mismatch: planned {expected}, observed {observed}")]
    SizeMismatch {
        block: &'static str,
        expected: usize,
        observed: usize,
    },

    #[error("Failed to move mesh file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl From<InpError> for Error {
    fn from(err: InpError) -> Self {
        match err {
            InpError::Syntax(err) => Error::Parse(err),
            InpError::Io(err) => Error::Io(err),
        }
    }
}
