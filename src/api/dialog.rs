//! Prompt submission and conversation state endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::dialog::{ConversationTurn, DialogMode, DialogSnapshot};

/// Build dialog router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/prompt", post(submit_prompt))
        .route("/api/cards/{card}", post(submit_card))
        .route("/api/conversation", get(conversation))
        .route("/api/conversation/new", post(new_conversation))
        .route("/api/display", get(display))
        .with_state(state)
}

/// Prompt submission request
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// A published (or superseded) turn plus the mode it left behind
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub turn: ConversationTurn,
    pub mode: DialogMode,
}

/// Display buffer response
#[derive(Debug, Serialize)]
pub struct DisplayResponse {
    pub text: String,
    pub revealing: bool,
}

async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Empty prompt".to_string()));
    }

    let turn = state.dialog.submit(&request.prompt).await;
    Ok(Json(TurnResponse {
        turn,
        mode: state.dialog.mode(),
    }))
}

async fn submit_card(
    State(state): State<Arc<AppState>>,
    Path(card): Path<String>,
) -> Json<TurnResponse> {
    let turn = state.dialog.submit_card(&card).await;
    Json(TurnResponse {
        turn,
        mode: state.dialog.mode(),
    })
}

async fn new_conversation(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dialog.new_conversation().await;
    StatusCode::NO_CONTENT
}

async fn conversation(State(state): State<Arc<AppState>>) -> Json<DialogSnapshot> {
    Json(state.dialog.snapshot())
}

async fn display(State(state): State<Arc<AppState>>) -> Json<DisplayResponse> {
    Json(DisplayResponse {
        text: state.dialog.display(),
        revealing: state.dialog.is_revealing(),
    })
}
