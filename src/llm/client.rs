//! Capability traits for the inference service.

use async_trait::async_trait;

use crate::context::Context;
use crate::domain::{StepResult, Target, Verdict};
use crate::error::Result;

/// Per-step image analysis. Stateless per call: the accumulated context is
/// passed in explicitly, never held by the client.
#[async_trait]
pub trait StepAnalyst: Send + Sync {
    /// Analyze one capture in the context of prior steps.
    ///
    /// Fails with `MalformedResponse` when the payload does not satisfy the
    /// step schema, `InvalidAction` when the action is outside the closed set,
    /// and `Transient` on network or rate-limit failures.
    async fn analyze(&self, image: &[u8], context: &Context, target: &Target) -> Result<StepResult>;
}

/// Final-verdict synthesis over a completed run's ordered step results.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize a verdict from the full, ordered set of step results.
    ///
    /// Fails with `MalformedResponse` when the payload does not satisfy the
    /// verdict schema. Callers must surface that error, not swallow it.
    async fn synthesize(&self, steps: &[StepResult]) -> Result<Verdict>;
}
