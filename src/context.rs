//! Context accumulation for successive inference calls.
//!
//! Step N's context reflects steps 0..N-1. The context is an immutable value:
//! `extend` returns a new Context rather than mutating in place, so a run can
//! be replayed deterministically in tests without a live client.
//!
//! Growth is capped: only the most recent `max_entries` step digests are kept,
//! so a long run cannot inflate request size without bound. Older digests fall
//! off the front; ordering of the survivors is preserved.

use crate::domain::StepResult;
use crate::id::analyst_label;

/// Default number of step digests carried into the next inference call.
pub const DEFAULT_MAX_ENTRIES: usize = 12;

/// Ordered digest of prior step results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    entries: Vec<String>,
    max_entries: usize,
    /// Total steps digested so far, including any that fell off the front.
    total_steps: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl Context {
    /// Create an empty context with the given entry cap.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
            total_steps: 0,
        }
    }

    /// Build a new context from this one plus one more step result.
    pub fn extend(&self, step: &StepResult) -> Context {
        let mut next = self.clone();
        next.entries.push(Self::digest(next.total_steps, step));
        next.total_steps += 1;
        if next.entries.len() > next.max_entries {
            let excess = next.entries.len() - next.max_entries;
            next.entries.drain(..excess);
        }
        next
    }

    /// Number of digests currently carried.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no step has been digested yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total steps ever digested, including evicted ones.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Render the context as prompt text, one analyst digest per block.
    pub fn render(&self) -> String {
        self.entries.join("\n\n")
    }

    fn digest(step_index: usize, step: &StepResult) -> String {
        let mut text = format!("{}:\n  analysis: {}", analyst_label(step_index), step.analysis);
        if !step.findings.is_empty() {
            text.push_str(&format!("\n  findings: {}", step.findings.join("; ")));
        }
        if !step.follow_ups.is_empty() {
            text.push_str(&format!("\n  follow up: {}", step.follow_ups.join("; ")));
        }
        text
    }
}
