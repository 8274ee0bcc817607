//! Error types for synthmon

use thiserror::Error;

use crate::codec::CodecError;
use crate::property::PropertyError;
use crate::record::RecordError;

/// Result type alias using the synthmon Error
pub type Result<T> = std::result::Result<T, Error>;

/// synthmon error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Property error: {0}")]
    Property(#[from] PropertyError),

    #[error("Invalid run record: {0}")]
    Record(#[from] RecordError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unsupported record format: {0}")]
    UnsupportedFormat(String),
}
