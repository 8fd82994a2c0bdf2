//! Assistant logic for the AI secretary
//!
//! This crate turns a `(session_id, prompt)` pair into an answer, keeping
//! the session's transcript up to date and pricing the exchange.

pub mod assistant;
pub mod context;

pub use assistant::{Assistant, AssistantError, ChatOutcome, MODEL};
pub use context::{ContextBuilder, SYSTEM_PROMPT};
