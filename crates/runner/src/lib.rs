//! synthmon Runner
//!
//! Executes monitoring pipelines:
//! - the [`Step`] contract and the composite [`Pipeline`]
//! - the [`RunBuilder`] that frames results into a run record
//! - generic [`Validator`] steps over stored properties
//! - [`Monitor`], the entrypoint hosts call
//! - TOML configuration

pub mod builder;
pub mod config;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod step;
pub mod stopwatch;
pub mod validate;

pub use builder::{BuilderState, RunBuilder, StepEntry};
pub use config::{CompareConfig, MonitorConfig, ReportConfig, RunSettings};
pub use error::{RunnerError, RunnerResult};
pub use monitor::Monitor;
pub use pipeline::Pipeline;
pub use step::{BoxedStep, Step};
pub use stopwatch::{timed, Stopwatch};
pub use validate::{expect_eq, Validator};

// Hosts implementing steps need these in their signatures
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
