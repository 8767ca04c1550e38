//! Step results - one analyst's structured report for a single capture.

use super::action::Action;
use serde::{Deserialize, Serialize};

/// Structured output of one step-analysis call. Immutable after creation.
///
/// Field aliases accept the key spellings some model deployments emit
/// (`things_to_continue_analyzing` for follow-ups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Identifiable structures, equipment and infrastructure, in report order
    #[serde(default)]
    pub findings: Vec<String>,

    /// Tactical analysis of the findings
    pub analysis: String,

    /// Features that warrant scrutiny in subsequent imagery
    #[serde(default, alias = "things_to_continue_analyzing")]
    pub follow_ups: Vec<String>,

    /// The viewport action the analyst requested
    pub action: Action,

    /// Original model payload, kept verbatim for audit
    #[serde(default)]
    pub raw_response: String,
}

impl StepResult {
    /// A synthetic terminal step recorded when inference output stayed
    /// unparsable through the whole retry budget. The run degrades to a clean
    /// finish instead of crashing the batch.
    pub fn degraded_finish(reason: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            findings: Vec::new(),
            analysis: format!("analysis unavailable: {}", reason.into()),
            follow_ups: Vec::new(),
            action: Action::Finish,
            raw_response: raw_response.into(),
        }
    }

    /// Returns true if this step was synthesized by the degrade policy rather
    /// than parsed from a model payload.
    pub fn is_degraded(&self) -> bool {
        self.analysis.starts_with("analysis unavailable:")
    }
}
