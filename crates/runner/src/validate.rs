//! Validators
//!
//! A validator is a step that reads a value an earlier step produced and
//! judges it. A missing upstream value fails with `insufficient_data`, which
//! keeps "the check never ran" apart from "the check ran and the data is
//! wrong" (`validation_failed`).

use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use synthmon_common::{codes, PropertyError, PropertyKey, StepError, StepKind};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::builder::{RunBuilder, StepEntry};
use crate::config::RunSettings;
use crate::step::Step;
use crate::stopwatch::Stopwatch;

/// Validate step over the value stored under `key`.
///
/// The value is looked up in the shared store first, then in the sub-stores
/// of earlier steps. The predicate returns `Err(message)` to reject it.
pub struct Validator<T, F> {
    name: String,
    key: PropertyKey,
    predicate: F,
    _value: PhantomData<fn() -> T>,
}

impl<T, F> Validator<T, F>
where
    T: Any,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, key: PropertyKey, predicate: F) -> Self {
        Self {
            name: name.into(),
            key,
            predicate,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    fn judge(&self, run: &RunBuilder) -> Result<(), StepError> {
        match run.property::<T>(&self.key) {
            Ok(value) => (self.predicate)(value).map_err(StepError::validation_failed),
            Err(e @ PropertyError::TypeMismatch { .. }) => {
                Err(StepError::new(codes::INSUFFICIENT_DATA, e.to_string()))
            }
            Err(_) => Err(StepError::insufficient_data(&self.key)),
        }
    }
}

/// Validator that requires the stored value to equal `expected`
pub fn expect_eq<T>(
    name: impl Into<String>,
    key: PropertyKey,
    expected: T,
) -> Validator<T, impl Fn(&T) -> Result<(), String> + Send + Sync>
where
    T: Any + PartialEq + Debug + Send + Sync,
{
    Validator::new(name, key.clone(), move |actual: &T| {
        if *actual == expected {
            Ok(())
        } else {
            Err(format!("'{}' is {:?}, expected {:?}", key, actual, expected))
        }
    })
}

#[async_trait]
impl<T, F> Step for Validator<T, F>
where
    T: Any,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Validate
    }

    async fn handle(
        &self,
        _url: &Url,
        _settings: &RunSettings,
        run: &mut RunBuilder,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let watch = Stopwatch::start();

        let entry = if cancel.is_cancelled() {
            StepEntry::cancelled(self, watch.stop())
        } else {
            match self.judge(run) {
                Ok(()) => StepEntry::succeeded(self, watch.stop()),
                Err(error) => StepEntry::failed(self, watch.stop(), error),
            }
        };

        run.record(entry);
        Ok(())
    }
}
