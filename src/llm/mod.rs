//! Inference capabilities and the Gemini client.
//!
//! Two independent capabilities sit behind one client abstraction: per-step
//! image analysis and verdict synthesis. The same backend may implement both,
//! but there is no shared mutable state between them.

pub mod backoff;
pub mod client;
pub mod gemini;
pub mod schema;

pub use backoff::BackoffState;
pub use client::{StepAnalyst, Synthesizer};
pub use gemini::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, GEMINI_API_URL, GeminiClient, GeminiConfig};
