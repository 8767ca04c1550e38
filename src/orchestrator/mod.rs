//! Batch orchestration - runs a set of targets through the analysis
//! pipeline with bounded parallelism and crash-safe persistence.
//!
//! Before any capture or inference happens, targets whose identity is
//! already present in the registry are skipped, so a re-run of the same
//! input file only processes what a previous crash left unfinished.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregator::Aggregator;
use crate::domain::{RunRecord, RunStatus, Target};
use crate::error::Result;
use crate::executor::StepExecutor;
use crate::imaging::ImagingService;
use crate::llm::{StepAnalyst, Synthesizer};
use crate::registry::RunRegistry;

/// Outcome counts for one batch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Runs that reached Finished or MaxStepsReached and were persisted.
    pub processed: usize,
    /// Targets skipped because their identity was already in the registry
    /// or duplicated within the batch.
    pub skipped: usize,
    /// Runs that ended Failed, plus tasks that did not return a record.
    pub failed: usize,
}

pub struct Orchestrator<A, S, Y, R>
where
    A: StepAnalyst + 'static,
    S: ImagingService + 'static,
    Y: Synthesizer + 'static,
    R: RunRegistry + 'static,
{
    executor: Arc<StepExecutor<A, S>>,
    aggregator: Arc<Aggregator<Y>>,
    registry: Arc<R>,
    parallel_targets: usize,
}

impl<A, S, Y, R> Orchestrator<A, S, Y, R>
where
    A: StepAnalyst + 'static,
    S: ImagingService + 'static,
    Y: Synthesizer + 'static,
    R: RunRegistry + 'static,
{
    pub fn new(
        executor: Arc<StepExecutor<A, S>>,
        aggregator: Arc<Aggregator<Y>>,
        registry: Arc<R>,
        parallel_targets: usize,
    ) -> Self {
        Self {
            executor,
            aggregator,
            registry,
            parallel_targets: parallel_targets.max(1),
        }
    }

    /// Process every new target in the batch and persist each terminal run.
    ///
    /// Each task appends its own record the moment its run ends, before the
    /// session permit is released, so a crash mid-batch can only lose runs
    /// that are still executing. Per-target failures are absorbed into the
    /// summary; only persistence errors abort the batch, since continuing
    /// without a working registry would silently discard completed work.
    pub async fn process_batch(&self, targets: &[Target], max_steps: u32) -> Result<BatchSummary> {
        let mut seen = self.registry.identities()?;
        let mut summary = BatchSummary::default();

        let permits = Arc::new(Semaphore::new(self.parallel_targets));
        let mut tasks: JoinSet<Result<RunStatus>> = JoinSet::new();

        for target in targets {
            if !seen.insert(target.key()) {
                log::info!("{}: already analyzed, skipping", target.key());
                summary.skipped += 1;
                continue;
            }

            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let executor = Arc::clone(&self.executor);
            let aggregator = Arc::clone(&self.aggregator);
            let registry = Arc::clone(&self.registry);
            let target = target.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let record = run_one(&executor, &aggregator, &target, max_steps).await;
                registry.append(&record)?;
                log::info!("{}: persisted with status {:?}", record.key(), record.status);
                Ok(record.status)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(RunStatus::Failed)) => summary.failed += 1,
                Ok(Ok(_)) => summary.processed += 1,
                Ok(Err(e)) => {
                    // A registry that stopped accepting writes ends the batch
                    tasks.shutdown().await;
                    return Err(e);
                }
                Err(e) => {
                    log::error!("analysis task did not complete: {}", e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Execute one target end to end: step loop, then verdict synthesis for
/// runs that produced analyzable steps. Aggregation failure downgrades the
/// run to Failed rather than losing the step history.
async fn run_one<A, S, Y>(
    executor: &StepExecutor<A, S>,
    aggregator: &Aggregator<Y>,
    target: &Target,
    max_steps: u32,
) -> RunRecord
where
    A: StepAnalyst,
    S: ImagingService,
    Y: Synthesizer,
{
    let mut record = executor.run(target, max_steps).await;

    if record.status.is_aggregatable() && !record.steps.is_empty() {
        match aggregator.aggregate(&record.steps).await {
            Ok(verdict) => record.attach_verdict(verdict),
            Err(e) => {
                log::warn!("{}: verdict synthesis failed: {}", record.key(), e);
                record.status = RunStatus::Failed;
            }
        }
    }

    record
}
