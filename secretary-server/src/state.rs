use secretary_agent::Assistant;
use secretary_core::TaskList;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub tasks: Arc<TaskList>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self {
            assistant,
            tasks: Arc::new(TaskList::new()),
        }
    }
}

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Rounded to 6 decimal places
    pub cost_usd: f64,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub task: String,
}
