//! Run records and verdicts
//!
//! A RunRecord is the full history of one target's bounded step sequence plus
//! the commander's final verdict, once aggregation has produced one.

use super::step::StepResult;
use super::target::Target;
use crate::id::now_ms;
use serde::{Deserialize, Serialize};

/// Status of a target run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Steps are still being executed
    InProgress,
    /// The analyst requested `finish` before the step budget ran out
    Finished,
    /// The step budget ran out without a `finish`
    MaxStepsReached,
    /// Imaging failure, invalid action, or aggregation failure
    Failed,
}

impl RunStatus {
    /// Returns true if the stepping phase ended cleanly, i.e. the run is
    /// eligible for aggregation.
    pub fn is_aggregatable(&self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::MaxStepsReached)
    }

    /// Returns true if the run reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::InProgress)
    }
}

/// Commander confidence in the overall assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Final synthesis over a run's step results.
///
/// Aliases accept the singular key spellings found in older persisted data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall_assessment: String,

    #[serde(default, alias = "key_confirmed_asset")]
    pub key_confirmed_assets: Vec<String>,

    #[serde(default, alias = "unresolved_item")]
    pub unresolved_items: Vec<String>,

    #[serde(default, alias = "recommended_action")]
    pub recommended_actions: Vec<String>,

    pub confidence_score: Confidence,
}

/// The full history of one target's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub target: Target,
    pub steps: Vec<StepResult>,
    pub verdict: Option<Verdict>,
    pub status: RunStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

impl RunRecord {
    /// Create an in-progress record for a target that is beginning processing.
    pub fn begin(target: Target) -> Self {
        Self {
            target,
            steps: Vec::new(),
            verdict: None,
            status: RunStatus::InProgress,
            started_at: now_ms(),
            completed_at: None,
        }
    }

    /// Identity key of the run's target.
    pub fn key(&self) -> String {
        self.target.key()
    }

    /// Append a completed step.
    pub fn push_step(&mut self, step: StepResult) {
        self.steps.push(step);
    }

    /// Seal the record in a terminal status.
    pub fn seal(&mut self, status: RunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.completed_at = Some(now_ms());
    }

    /// Attach the commander's verdict. Valid only for a run whose stepping
    /// phase ended cleanly.
    pub fn attach_verdict(&mut self, verdict: Verdict) {
        debug_assert!(self.status.is_aggregatable());
        self.verdict = Some(verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::Action;

    fn sample_step() -> StepResult {
        StepResult {
            findings: vec!["radar dome".to_string()],
            analysis: "early warning installation".to_string(),
            follow_ups: vec![],
            action: Action::Finish,
            raw_response: String::new(),
        }
    }

    fn sample_verdict() -> Verdict {
        Verdict {
            overall_assessment: "confirmed installation".to_string(),
            key_confirmed_assets: vec!["radar dome".to_string()],
            unresolved_items: vec![],
            recommended_actions: vec!["continued monitoring".to_string()],
            confidence_score: Confidence::Medium,
        }
    }

    #[test]
    fn test_begin_is_in_progress() {
        let record = RunRecord::begin(Target::new(10.0, 20.0, "X"));
        assert_eq!(record.status, RunStatus::InProgress);
        assert!(record.steps.is_empty());
        assert!(record.verdict.is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_seal_sets_completed_at() {
        let mut record = RunRecord::begin(Target::new(10.0, 20.0, "X"));
        record.seal(RunStatus::Finished);
        assert_eq!(record.status, RunStatus::Finished);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_push_step_preserves_order() {
        let mut record = RunRecord::begin(Target::new(10.0, 20.0, "X"));
        let mut first = sample_step();
        first.analysis = "first".to_string();
        let mut second = sample_step();
        second.analysis = "second".to_string();

        record.push_step(first);
        record.push_step(second);

        assert_eq!(record.steps[0].analysis, "first");
        assert_eq!(record.steps[1].analysis, "second");
    }

    #[test]
    fn test_aggregatable_statuses() {
        assert!(RunStatus::Finished.is_aggregatable());
        assert!(RunStatus::MaxStepsReached.is_aggregatable());
        assert!(!RunStatus::Failed.is_aggregatable());
        assert!(!RunStatus::InProgress.is_aggregatable());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Finished.is_terminal());
        assert!(RunStatus::MaxStepsReached.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_attach_verdict() {
        let mut record = RunRecord::begin(Target::new(10.0, 20.0, "X"));
        record.push_step(sample_step());
        record.seal(RunStatus::Finished);
        record.attach_verdict(sample_verdict());
        assert_eq!(
            record.verdict.unwrap().confidence_score,
            Confidence::Medium
        );
    }

    #[test]
    fn test_verdict_accepts_singular_aliases() {
        let json = r#"{
            "overall_assessment": "likely airbase",
            "key_confirmed_asset": ["runway"],
            "unresolved_item": ["unidentified vehicles"],
            "recommended_action": ["tasking at lower altitude"],
            "confidence_score": "High"
        }"#;
        let verdict: Verdict = serde_json::from_str(json).unwrap();
        assert_eq!(verdict.key_confirmed_assets, vec!["runway"]);
        assert_eq!(verdict.unresolved_items, vec!["unidentified vehicles"]);
        assert_eq!(verdict.confidence_score, Confidence::High);
    }

    #[test]
    fn test_verdict_rejects_unknown_confidence() {
        let json = r#"{
            "overall_assessment": "x",
            "confidence_score": "Certain"
        }"#;
        assert!(serde_json::from_str::<Verdict>(json).is_err());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&RunStatus::MaxStepsReached).unwrap();
        assert_eq!(json, "\"max_steps_reached\"");
    }
}
