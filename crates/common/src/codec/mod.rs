//! Run record serialization
//!
//! Two interchange formats are supported:
//! - XML, written and read with `quick-xml` events
//! - a compact MessagePack form via `rmp-serde`
//!
//! Only persistent property values are written. Decoded records are restored
//! as they were captured; framing invariants tied to "today" are not checked
//! again.

mod binary;
mod xml;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};
use crate::property::PropertyError;
use crate::record::RunRecord;

/// Errors raised while encoding or decoding a run record
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Unexpected element <{0}>")]
    UnexpectedElement(String),

    #[error("Unexpected end of document")]
    UnexpectedEof,

    #[error("Invalid property: {0}")]
    Property(#[from] PropertyError),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

impl CodecError {
    pub(crate) fn invalid(field: &'static str, reason: impl ToString) -> Self {
        CodecError::InvalidValue {
            field,
            reason: reason.to_string(),
        }
    }
}

/// Interchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Binary,
}

impl Format {
    /// Pick a format from a file extension (`xml`, `msgpack`, `bin`)
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "xml" => Some(Format::Xml),
            "msgpack" | "bin" => Some(Format::Binary),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Binary => "msgpack",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialize a record
pub fn encode(record: &RunRecord, format: Format) -> std::result::Result<Vec<u8>, CodecError> {
    let bytes = match format {
        Format::Xml => xml::write(record)?,
        Format::Binary => binary::write(record)?,
    };
    debug!("Encoded run {} as {} ({} bytes)", record.id(), format, bytes.len());
    Ok(bytes)
}

/// Deserialize a record
pub fn decode(bytes: &[u8], format: Format) -> std::result::Result<RunRecord, CodecError> {
    match format {
        Format::Xml => xml::read(bytes),
        Format::Binary => binary::read(bytes),
    }
}

/// Read a record from disk, choosing the format from the extension
pub fn read_file(path: &Path) -> Result<RunRecord> {
    let format = Format::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    Ok(decode(&bytes, format)?)
}

/// Write a record to disk, choosing the format from the extension
pub fn write_file(path: &Path, record: &RunRecord) -> Result<()> {
    let format = Format::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    let bytes = encode(record, format)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
