//! Step timing

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use synthmon_common::StepTiming;

/// Wall-clock start plus a monotonic timer. One per step invocation; never
/// shared between concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: DateTime<Utc>,
    instant: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Utc::now(),
            instant: Instant::now(),
        }
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }

    /// Timing from start until now
    pub fn stop(&self) -> StepTiming {
        StepTiming::new(self.started, self.elapsed())
    }
}

/// Await `future` and report how long it took
pub async fn timed<F: Future>(future: F) -> (F::Output, StepTiming) {
    let watch = Stopwatch::start();
    let output = future.await;
    (output, watch.stop())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_measures_the_future() {
        let (value, timing) = timed(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;

        assert_eq!(value, 7);
        assert!(timing.duration >= Duration::from_millis(20));
        assert!(timing.started <= Utc::now());
    }
}
