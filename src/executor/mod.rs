//! Step executor - drives one target through its bounded step sequence.
//!
//! Each step captures imagery for the current viewport, asks the analyst
//! capability to interpret it with the accumulated context, records the
//! result, and applies the requested viewport action. The loop ends on a
//! `finish` action, on the step budget, or on a failure policy below:
//!
//! - imaging failure: the run is sealed `Failed` with its partial steps
//! - unparsable inference output: retried with backoff; when the budget is
//!   exhausted the step is forced to `finish` and the run ends cleanly
//! - transient inference failure: retried the same way; exhaustion seals the
//!   run `Failed` (an unreachable service is not an analysis outcome)
//! - out-of-set action: seals the run `Failed` immediately, no retry

use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::domain::{RunRecord, RunStatus, Target, ViewportState};
use crate::error::ArgusError;
use crate::id::capture_id;
use crate::imaging::ImagingService;
use crate::llm::StepAnalyst;

/// Configuration for the step executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Camera altitude for step 0, meters.
    pub initial_altitude: f64,
    /// Altitude change per zoom action, meters.
    pub zoom_delta: f64,
    /// Longitude change per pan action, degrees.
    pub pan_delta: f64,
    /// Inference attempts per step before the failure policy applies.
    pub retry_attempts: u32,
    /// Base backoff between attempts; doubles each retry.
    pub retry_backoff: Duration,
    /// Step digests carried in the context window.
    pub context_entries: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            initial_altitude: 20000.0,
            zoom_delta: 5000.0,
            pan_delta: 0.01,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(250),
            context_entries: crate::context::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Executes the bounded capture-analyze-transition loop for one target.
pub struct StepExecutor<A, S>
where
    A: StepAnalyst,
    S: ImagingService,
{
    analyst: Arc<A>,
    imaging: Arc<S>,
    config: ExecutorConfig,
}

impl<A, S> StepExecutor<A, S>
where
    A: StepAnalyst,
    S: ImagingService,
{
    /// Create an executor with the given capabilities.
    pub fn new(analyst: Arc<A>, imaging: Arc<S>, config: ExecutorConfig) -> Self {
        Self {
            analyst,
            imaging,
            config,
        }
    }

    /// Run one target to a terminal status. Failures are encoded in the
    /// returned record, never propagated: a single target can never abort the
    /// batch from here.
    pub async fn run(&self, target: &Target, max_steps: u32) -> RunRecord {
        let mut record = RunRecord::begin(target.clone());
        let mut view =
            ViewportState::new(target.latitude, target.longitude, self.config.initial_altitude);
        let mut context = Context::new(self.config.context_entries);
        let key = target.key();

        for step_index in 0..max_steps as usize {
            let identifier = capture_id(&key, step_index);

            let image = match self.imaging.capture(&view, &identifier).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("{}: capture failed at step {}: {}", key, step_index + 1, e);
                    record.seal(RunStatus::Failed);
                    return record;
                }
            };

            let step = match self.analyze_with_retry(&image, &context, target).await {
                Ok(step) => step,
                Err(ArgusError::MalformedResponse(reason)) => {
                    log::warn!(
                        "{}: step {} output unparsable after {} attempts, forcing finish",
                        key,
                        step_index + 1,
                        self.config.retry_attempts
                    );
                    crate::domain::StepResult::degraded_finish(
                        format!(
                            "model output failed validation after {} attempts",
                            self.config.retry_attempts
                        ),
                        reason,
                    )
                }
                Err(e) => {
                    log::warn!("{}: step {} failed: {}", key, step_index + 1, e);
                    record.seal(RunStatus::Failed);
                    return record;
                }
            };

            record.push_step(step.clone());
            context = context.extend(&step);
            view = view.transition(step.action, self.config.zoom_delta, self.config.pan_delta);

            if step.action.is_terminal() {
                record.seal(RunStatus::Finished);
                return record;
            }
        }

        record.seal(RunStatus::MaxStepsReached);
        record
    }

    /// Call the analyst, retrying retryable failures with doubling backoff.
    /// Non-retryable errors (invalid action and the like) surface immediately.
    async fn analyze_with_retry(
        &self,
        image: &[u8],
        context: &Context,
        target: &Target,
    ) -> crate::error::Result<crate::domain::StepResult> {
        let attempts = self.config.retry_attempts.max(1);
        let mut backoff = self.config.retry_backoff;

        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.analyst.analyze(image, context, target).await {
                Ok(step) => return Ok(step),
                Err(e) if e.is_retryable() => {
                    log::debug!("inference attempt {}/{} failed: {}", attempt, attempts, e);
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.expect("at least one attempt was made"))
    }
}
