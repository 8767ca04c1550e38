//! Domain types for Argus
//!
//! Pure data: targets, viewport state, actions, step results, run records.
//! Nothing here touches the network or the filesystem.

pub mod action;
pub mod run_record;
pub mod step;
pub mod target;
pub mod viewport;

pub use action::Action;
pub use run_record::{Confidence, RunRecord, RunStatus, Verdict};
pub use step::StepResult;
pub use target::Target;
pub use viewport::ViewportState;
