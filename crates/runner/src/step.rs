//! The step contract

use async_trait::async_trait;
use synthmon_common::StepKind;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::builder::RunBuilder;
use crate::config::RunSettings;

/// A unit of execution: a check, a validator or a nested pipeline.
///
/// A step records its own result on the [`RunBuilder`]. Returning `Err` means
/// the step hit something it did not anticipate; the enclosing pipeline turns
/// that into a failed result (code `fault`) for the step, so a step that
/// returns `Err` should not also record a result. Steps are expected to check
/// `cancel` around their own I/O and record a `cancelled` failure instead of
/// returning early without a result.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> StepKind;

    async fn handle(
        &self,
        url: &Url,
        settings: &RunSettings,
        run: &mut RunBuilder,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

pub type BoxedStep = Box<dyn Step>;
