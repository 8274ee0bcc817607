//! Core types for synthmon run records

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A textual enum value that does not name any variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),* $(,)? }) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => write!(f, $text),)*
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)*
                    _ => Err(UnknownVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

/// What a step does; `Composite` marks a nested group of steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Action,
    Validate,
    Composite,
}

text_enum!(StepKind, "step kind", {
    Action => "action",
    Validate => "validate",
    Composite => "composite",
});

/// Step outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

text_enum!(Outcome, "outcome", {
    Succeeded => "succeeded",
    Failed => "failed",
});

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Completed,
    Declined,
}

impl Default for RunState {
    fn default() -> Self {
        Self::NotStarted
    }
}

text_enum!(RunState, "run state", {
    NotStarted => "not_started",
    Completed => "completed",
    Declined => "declined",
});

/// Well-known step error codes
pub mod codes {
    /// An upstream property the step depends on is absent
    pub const INSUFFICIENT_DATA: &str = "insufficient_data";
    /// The data is present but does not satisfy the check
    pub const VALIDATION_FAILED: &str = "validation_failed";
    /// Unexpected error or panic raised by the step itself
    pub const FAULT: &str = "fault";
    pub const CANCELLED: &str = "cancelled";
    pub const TIMEOUT: &str = "timeout";
}

/// Structured error attached to a failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub code: String,
    pub message: String,
}

impl StepError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn insufficient_data(key: impl fmt::Display) -> Self {
        Self::new(
            codes::INSUFFICIENT_DATA,
            format!("required property '{}' was not produced by an earlier step", key),
        )
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(codes::VALIDATION_FAILED, message)
    }

    /// Wrap an unexpected error. The message keeps the original text.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(codes::FAULT, message)
    }

    pub fn cancelled() -> Self {
        Self::new(codes::CANCELLED, "run was cancelled before the step completed")
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(codes::TIMEOUT, format!("step timed out after {} ms", after.as_millis()))
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// When a step started and how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    pub started: DateTime<Utc>,
    pub duration: Duration,
}

impl StepTiming {
    pub fn new(started: DateTime<Utc>, duration: Duration) -> Self {
        Self { started, duration }
    }

    /// A zero-length timing starting now
    pub fn instant() -> Self {
        Self::new(Utc::now(), Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(RunState::NotStarted, "not_started")]
    #[test_case(RunState::Completed, "completed")]
    #[test_case(RunState::Declined, "declined")]
    fn test_run_state_text(state: RunState, text: &str) {
        assert_eq!(state.to_string(), text);
        assert_eq!(text.parse::<RunState>(), Ok(state));
    }

    #[test]
    fn test_unknown_variant() {
        let err = "skipped".parse::<Outcome>().unwrap_err();
        assert_eq!(err.kind, "outcome");
        assert_eq!(err.to_string(), "Unknown outcome: skipped");
    }

    #[test]
    fn test_step_error_codes() {
        let err = StepError::insufficient_data("http.status");
        assert!(err.is(codes::INSUFFICIENT_DATA));
        assert!(err.message.contains("http.status"));
        assert_eq!(StepError::fault("boom").to_string(), "[fault] boom");
    }
}
