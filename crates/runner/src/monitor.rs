//! Host entrypoint: run a pipeline against a target and get a record back

use chrono::{NaiveDate, Utc};
use synthmon_common::RunRecord;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::builder::RunBuilder;
use crate::config::RunSettings;
use crate::pipeline::Pipeline;
use crate::step::Step;

#[derive(Debug)]
pub struct Monitor {
    pipeline: Pipeline,
    reference_date: Option<NaiveDate>,
}

impl Monitor {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            reference_date: None,
        }
    }

    /// Pin the date runs are framed against instead of today
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Run every step once against `url`. Always returns a record.
    pub async fn run(&self, url: &str, settings: &RunSettings) -> RunRecord {
        self.run_with_cancel(url, settings, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), observing `cancel` between steps. A run that
    /// cannot be framed is declined without running any step.
    pub async fn run_with_cancel(
        &self,
        url: &str,
        settings: &RunSettings,
        cancel: &CancellationToken,
    ) -> RunRecord {
        let mut run = RunBuilder::new();
        if let Some(date) = self.reference_date {
            run = run.with_reference_date(date);
        }
        run.initiate(Some(url), Utc::now());

        let target = match run.validate() {
            Ok(target) => target,
            Err(e) => {
                warn!("Not running '{}' against {}: {}", self.pipeline.name(), url, e);
                return run.into_record();
            }
        };

        info!("Running '{}' against {}", self.pipeline.name(), target);
        if let Err(e) = self.pipeline.handle(&target, settings, &mut run, cancel).await {
            // Pipelines wrap child faults, so this only fires for a custom root step
            warn!("Pipeline '{}' returned an error: {:#}", self.pipeline.name(), e);
        }

        run.into_record()
    }
}
