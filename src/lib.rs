//! Argus - batch orchestration for LLM-driven satellite imagery analysis
//!
//! Argus walks a list of geographic targets through a bounded analysis loop:
//! capture imagery for the current viewport, ask the model what it sees and
//! where to look next, then synthesize the step history into a final verdict.
//! Completed runs are persisted to an append-only registry so interrupted
//! batches resume where they left off.

pub mod aggregator;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod executor;
pub mod id;
pub mod imaging;
pub mod ingest;
pub mod llm;
pub mod orchestrator;
pub mod registry;

pub use error::{ArgusError, Result};
