//! Image upload: extract text, then submit it as a prompt

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, header},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::dialog::TurnResponse;
use super::{ApiError, AppState};

/// Headroom over the image limit so oversize uploads get a typed error
const BODY_SLACK: usize = 64 * 1024;

/// Build image router
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.ocr.max_bytes().saturating_add(BODY_SLACK);
    Router::new()
        .route("/api/image", post(upload_image))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Optional prompt sent along with the image
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub prompt: Option<String>,
}

/// Extracted text and the turn it produced
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub text: String,
    #[serde(flatten)]
    pub turn: TurnResponse,
}

async fn upload_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty image data".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let text = state
        .ocr
        .extract_text(query.prompt.as_deref(), content_type, body.to_vec())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "image text extraction failed");
            ApiError::from(e)
        })?;

    let turn = state.dialog.submit(&text).await;
    Ok(Json(ImageResponse {
        text,
        turn: TurnResponse {
            turn,
            mode: state.dialog.mode(),
        },
    }))
}
