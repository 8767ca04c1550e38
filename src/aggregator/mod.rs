//! Verdict aggregation - folds a run's step results into a single verdict.

use std::sync::Arc;

use crate::domain::{StepResult, Verdict};
use crate::error::{ArgusError, Result};
use crate::llm::Synthesizer;

/// Produces the final verdict for a completed run. Thin by design: the
/// synthesis capability does the work, this layer enforces the input
/// contract and surfaces failures to the caller.
pub struct Aggregator<Y: Synthesizer> {
    synthesizer: Arc<Y>,
}

impl<Y: Synthesizer> Aggregator<Y> {
    pub fn new(synthesizer: Arc<Y>) -> Self {
        Self { synthesizer }
    }

    /// Synthesize a verdict from the full ordered step history.
    ///
    /// An empty history is a caller bug and is rejected up front rather than
    /// being sent to the model.
    pub async fn aggregate(&self, steps: &[StepResult]) -> Result<Verdict> {
        if steps.is_empty() {
            return Err(ArgusError::EmptyInput);
        }
        self.synthesizer.synthesize(steps).await
    }
}
