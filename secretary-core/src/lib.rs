//! Core types for the AI secretary
//!
//! This crate owns the conversational state (the session store), the
//! pricing table used to estimate request cost, the in-memory task list,
//! and the configuration and logging setup shared by the other crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod pricing;
pub mod session;
pub mod tasks;

pub use error::{Error, Result};
pub use pricing::{ModelPricing, PricingRegistry};
pub use session::{ChatMessage, Role, SessionStore, Transcript};
pub use tasks::{Task, TaskList};
