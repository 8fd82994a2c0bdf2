//! LLM completion providers for the AI secretary
//!
//! This crate defines the completion capability the assistant depends on
//! and an OpenAI-compatible HTTP implementation of it.

pub mod base;
pub mod openai;

pub use base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult, Usage};
pub use openai::OpenAIClient;
