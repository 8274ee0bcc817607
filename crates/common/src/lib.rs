//! synthmon Common Library
//!
//! Data model shared by the runner, the comparison engine and the CLI:
//! - typed property keys and the heterogeneous [`PropertyStore`]
//! - immutable [`StepResult`] and [`RunRecord`] values
//! - XML and MessagePack serialization of run records

pub mod codec;
pub mod error;
pub mod keys;
pub mod property;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use codec::{CodecError, Format};
pub use error::{Error, Result};
pub use property::{PropertyError, PropertyKey, PropertyStore, Value};
pub use record::{lookup_step_property, RecordError, RunDraft, RunRecord, StepResult};
pub use types::*;

/// synthmon version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
