//! Session management for conversation history
//!
//! Each session id maps to one transcript. Transcripts live in memory only
//! and grow without bound; they are lost when the process exits.

pub mod store;
pub mod transcript;

pub use store::SessionStore;
pub use transcript::{ChatMessage, Role, Transcript};
