//! Bounded fan-out / fan-in of completion calls within one stage.
//!
//! All units are polled together inside the calling stage's future, so they
//! interleave only at their await points and never run stage logic at the
//! same instant. A semaphore caps how many units are past their dispatch
//! point at once. Results come back in completion order.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::domain::StageName;
use crate::obs;
use crate::pipeline::error::PipelineResult;

/// Default cap on in-flight completion calls per stage.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Environment variable overriding [`DEFAULT_MAX_CONCURRENT`].
pub const MAX_CONCURRENT_ENV: &str = "ACE_MAX_CONCURRENT_CALLS";

/// Configuration for a stage's fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Maximum number of concurrent completion calls. Clamped to
    /// `1..=Semaphore::MAX_PERMITS` when the semaphore is built.
    pub max_concurrent: usize,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl FanOutConfig {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Read `ACE_MAX_CONCURRENT_CALLS`, falling back to the default when unset or invalid.
    pub fn from_env() -> Self {
        std::env::var(MAX_CONCURRENT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn permits(&self) -> usize {
        self.max_concurrent.clamp(1, Semaphore::MAX_PERMITS)
    }
}

/// Run `unit` once per item, at most `config.permits()` at a time.
///
/// `unit` receives the item's submission index. On success the outputs are
/// returned in completion order. The first failure is returned immediately
/// and the remaining in-flight units are dropped.
pub async fn fan_out<I, T, F, Fut>(
    stage: StageName,
    items: I,
    config: &FanOutConfig,
    unit: F,
) -> PipelineResult<Vec<T>>
where
    I: IntoIterator,
    F: Fn(usize, I::Item) -> Fut,
    Fut: Future<Output = PipelineResult<T>>,
{
    let semaphore = Semaphore::new(config.permits());
    let semaphore = &semaphore;
    let unit = &unit;

    let mut pending: FuturesUnordered<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| async move {
            let _permit = semaphore.acquire().await.ok();
            unit(index, item).await
        })
        .collect();

    obs::emit_fan_out_dispatched(stage, pending.len(), config.permits());

    let mut outputs = Vec::with_capacity(pending.len());
    while let Some(outcome) = pending.next().await {
        outputs.push(outcome?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::PipelineError;
    use crate::provider::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_config_clamps_to_one() {
        assert_eq!(FanOutConfig::new(0).permits(), 1);
        assert_eq!(
            FanOutConfig {
                max_concurrent: 0
            }
            .permits(),
            1
        );
        assert_eq!(FanOutConfig::default().permits(), DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn test_config_clamps_to_semaphore_limit() {
        assert_eq!(
            FanOutConfig::new(usize::MAX).permits(),
            Semaphore::MAX_PERMITS
        );
    }

    #[tokio::test]
    async fn test_unbounded_cap_runs_every_unit() {
        let outputs = fan_out(
            StageName::Reflector,
            0..3,
            &FanOutConfig::new(usize::MAX),
            |index, _| async move { Ok(index) },
        )
        .await
        .unwrap();
        assert_eq!(outputs.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outputs_follow_completion_order() {
        let delays = vec![30u64, 10, 20];
        let outputs = fan_out(
            StageName::Reflector,
            delays,
            &FanOutConfig::default(),
            |index, delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(index)
            },
        )
        .await
        .unwrap();
        assert_eq!(outputs, vec![1, 2, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_units_never_exceed_cap() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let outputs = fan_out(
            StageName::Curator,
            0..10,
            &FanOutConfig::new(3),
            |_, item| {
                let in_flight = &in_flight;
                let peak = &peak;
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(item)
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(outputs.len(), 10);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let started = AtomicUsize::new(0);
        let result: PipelineResult<Vec<usize>> = fan_out(
            StageName::Reflector,
            0..4,
            &FanOutConfig::new(1),
            |index, _| {
                let started = &started;
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    if index == 1 {
                        Err(PipelineError::Provider {
                            stage: StageName::Reflector,
                            source: ProviderError::Network("connection reset".to_string()),
                        })
                    } else {
                        Ok(index)
                    }
                }
            },
        )
        .await;

        assert!(result.unwrap_err().is_provider());
        // Serialised by the cap, so not every unit gets to start.
        assert!(started.load(Ordering::SeqCst) < 4);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let outputs: Vec<()> = fan_out(
            StageName::Reflector,
            Vec::<()>::new(),
            &FanOutConfig::default(),
            |_, item| async move { Ok(item) },
        )
        .await
        .unwrap();
        assert!(outputs.is_empty());
    }
}
