//! Composite step
//!
//! A [`Pipeline`] owns an ordered list of child steps and is itself a
//! [`Step`], so checks, validators and nested groups compose freely. Children
//! run one at a time, in insertion order, against the same run builder.
//!
//! The pipeline is the fault boundary: a child that returns `Err` or panics
//! gets a failed result with code `fault`, and the remaining children still
//! run unless the pipeline stops on failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use synthmon_common::{StepKind, StepTiming};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::builder::{RunBuilder, StepEntry};
use crate::config::RunSettings;
use crate::step::{BoxedStep, Step};
use crate::stopwatch::Stopwatch;

pub struct Pipeline {
    name: String,
    children: Vec<BoxedStep>,
    stop_on_failure: Option<bool>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            stop_on_failure: None,
        }
    }

    /// Override `RunSettings::stop_on_failure` for this pipeline only
    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = Some(stop);
        self
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, step: impl Step + 'static) -> Self {
        self.add(step);
        self
    }

    /// Append a child
    pub fn add(&mut self, step: impl Step + 'static) -> &mut Self {
        self.children.push(Box::new(step));
        self
    }

    pub fn add_boxed(&mut self, step: BoxedStep) -> &mut Self {
        self.children.push(step);
        self
    }

    /// Remove the first child with this name. Removing an absent child is
    /// not an error.
    pub fn remove(&mut self, name: &str) -> Option<BoxedStep> {
        let index = self.children.iter().position(|c| c.name() == name)?;
        Some(self.children.remove(index))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names in execution order
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.name())
    }

    fn stops_on_failure(&self, settings: &RunSettings) -> bool {
        self.stop_on_failure.unwrap_or(settings.stop_on_failure)
    }

    async fn run_child(
        child: &dyn Step,
        url: &Url,
        settings: &RunSettings,
        run: &mut RunBuilder,
        cancel: &CancellationToken,
    ) {
        let watch = Stopwatch::start();
        let outcome = AssertUnwindSafe(child.handle(url, settings, run, cancel))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Step '{}' faulted: {:#}", child.name(), e);
                run.record(StepEntry::faulted(child, watch.stop(), e));
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Step '{}' panicked: {}", child.name(), message);
                run.record(StepEntry::faulted(child, watch.stop(), format!("panic: {}", message)));
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("children", &self.child_names().collect::<Vec<_>>())
            .field("stop_on_failure", &self.stop_on_failure)
            .finish()
    }
}

#[async_trait]
impl Step for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Composite
    }

    async fn handle(
        &self,
        url: &Url,
        settings: &RunSettings,
        run: &mut RunBuilder,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let stop_on_failure = self.stops_on_failure(settings);
        debug!("Pipeline '{}' running {} step(s)", self.name, self.children.len());

        for (index, child) in self.children.iter().enumerate() {
            if cancel.is_cancelled() {
                let remaining = &self.children[index..];
                warn!(
                    "Pipeline '{}' cancelled, skipping {} step(s)",
                    self.name,
                    remaining.len()
                );
                for skipped in remaining {
                    run.record(StepEntry::cancelled(skipped.as_ref(), StepTiming::instant()));
                }
                break;
            }

            let recorded = run.steps().len();
            Self::run_child(child.as_ref(), url, settings, run, cancel).await;

            if stop_on_failure && run.steps()[recorded..].iter().any(|s| s.failed()) {
                debug!(
                    "Pipeline '{}' stopping after failed step '{}'",
                    self.name,
                    child.name()
                );
                break;
            }
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthmon_common::Outcome;

    struct Noop(&'static str);

    #[async_trait]
    impl Step for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn kind(&self) -> StepKind {
            StepKind::Action
        }

        async fn handle(
            &self,
            _url: &Url,
            _settings: &RunSettings,
            run: &mut RunBuilder,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            run.record(StepEntry::succeeded(self, StepTiming::instant()));
            Ok(())
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut pipeline = Pipeline::new("checks").with(Noop("dns")).with(Noop("http"));
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.kind(), StepKind::Composite);

        let removed = pipeline.remove("dns");
        assert_eq!(removed.map(|s| s.name().to_string()), Some("dns".to_string()));
        assert!(pipeline.remove("dns").is_none());
        assert_eq!(pipeline.child_names().collect::<Vec<_>>(), vec!["http"]);
    }

    #[test]
    fn test_remove_first_of_duplicates() {
        let mut pipeline = Pipeline::new("checks")
            .with(Noop("http"))
            .with(Noop("dns"))
            .with(Noop("http"));
        pipeline.remove("http");
        assert_eq!(pipeline.child_names().collect::<Vec<_>>(), vec!["dns", "http"]);
    }

    #[test]
    fn test_stop_on_failure_falls_back_to_settings() {
        let settings = RunSettings {
            stop_on_failure: true,
            ..Default::default()
        };
        assert!(Pipeline::new("a").stops_on_failure(&settings));
        assert!(!Pipeline::new("b").stop_on_failure(false).stops_on_failure(&settings));
    }

    #[tokio::test]
    async fn test_empty_pipeline_records_nothing() {
        let url = Url::parse("https://example.com/").unwrap();
        let mut run = RunBuilder::new();
        Pipeline::new("empty")
            .handle(&url, &RunSettings::default(), &mut run, &CancellationToken::new())
            .await
            .unwrap();
        assert!(run.steps().is_empty());
    }

    #[tokio::test]
    async fn test_panic_becomes_fault() {
        struct Panics;

        #[async_trait]
        impl Step for Panics {
            fn name(&self) -> &str {
                "panics"
            }

            fn kind(&self) -> StepKind {
                StepKind::Action
            }

            async fn handle(
                &self,
                _url: &Url,
                _settings: &RunSettings,
                _run: &mut RunBuilder,
                _cancel: &CancellationToken,
            ) -> anyhow::Result<()> {
                panic!("socket exploded");
            }
        }

        let url = Url::parse("https://example.com/").unwrap();
        let mut run = RunBuilder::new();
        Pipeline::new("checks")
            .with(Panics)
            .with(Noop("after"))
            .handle(&url, &RunSettings::default(), &mut run, &CancellationToken::new())
            .await
            .unwrap();

        let steps = run.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].outcome(), Outcome::Failed);
        let error = steps[0].error().unwrap();
        assert!(error.is(synthmon_common::codes::FAULT));
        assert!(error.message.contains("socket exploded"));
        assert!(steps[1].succeeded());
    }
}
