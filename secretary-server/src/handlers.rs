use axum::{extract::State, Json};
use secretary_core::pricing::round_usd;
use secretary_core::Task;

use crate::error::ApiError;
use crate::state::{AddTaskRequest, AppState, ChatRequest, ChatResponse, ResetRequest};

/// Status line served on `GET /`
pub const STATUS_TEXT: &str = "✅ AI secretary is online (multi-turn memory enabled)";

pub async fn index_handler() -> &'static str {
    STATUS_TEXT
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let outcome = state
        .assistant
        .handle(&payload.session_id, &payload.prompt)
        .await?;

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        input_tokens: outcome.input_tokens,
        output_tokens: outcome.output_tokens,
        cost_usd: round_usd(outcome.cost_usd),
        session_id: payload.session_id,
    }))
}

pub async fn reset_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Json<serde_json::Value> {
    state.assistant.reset(&payload.session_id);

    Json(serde_json::json!({
        "status": "success",
        "message": format!("Session {} has been reset", payload.session_id),
    }))
}

pub async fn add_task_handler(
    State(state): State<AppState>,
    Json(payload): Json<AddTaskRequest>,
) -> Json<serde_json::Value> {
    let tasks: Vec<Task> = state.tasks.add(payload.task.clone());
    tracing::info!(task = %payload.task, total = tasks.len(), "Task added");

    Json(serde_json::json!({
        "status": "success",
        "tasks": tasks,
    }))
}
