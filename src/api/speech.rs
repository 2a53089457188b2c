//! Speech and voice selection endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::voice::{SpeechSession, SpeechStatus, Voice};

/// Build speech router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/speech", get(status))
        .route("/api/speech/mute", post(set_muted))
        .route("/api/speech/toggle-mute", post(toggle_mute))
        .route("/api/speech/stop", post(stop))
        .route("/api/speech/replay", post(replay))
        .route("/api/voices", get(voices))
        .route("/api/voices/selected", put(select_voice))
        .with_state(state)
}

/// Speech state response
#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    pub status: SpeechStatus,
    pub muted: bool,
    pub tts_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SpeechSession>,
}

/// Mute request
#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

/// Replay response
#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub session: Option<SpeechSession>,
}

/// Voice list response
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
    pub selected: String,
}

/// Voice selection request
#[derive(Debug, Deserialize)]
pub struct SelectVoiceRequest {
    pub voice_id: String,
}

async fn speech_response(state: &AppState) -> SpeechResponse {
    let speech = state.dialog.speech();
    SpeechResponse {
        status: speech.status(),
        muted: speech.is_muted(),
        tts_available: speech.tts_available(),
        backend: speech.backend_name(),
        session: speech.current_session().await,
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<SpeechResponse> {
    Json(speech_response(&state).await)
}

async fn set_muted(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MuteRequest>,
) -> Json<SpeechResponse> {
    state.dialog.speech().set_muted(request.muted).await;
    Json(speech_response(&state).await)
}

async fn toggle_mute(State(state): State<Arc<AppState>>) -> Json<SpeechResponse> {
    state.dialog.speech().toggle_mute().await;
    Json(speech_response(&state).await)
}

async fn stop(State(state): State<Arc<AppState>>) -> Json<SpeechResponse> {
    state.dialog.speech().stop().await;
    Json(speech_response(&state).await)
}

async fn replay(State(state): State<Arc<AppState>>) -> Json<ReplayResponse> {
    Json(ReplayResponse {
        session: state.dialog.replay().await,
    })
}

async fn voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    let speech = state.dialog.speech();
    Json(VoicesResponse {
        voices: speech.available_voices().to_vec(),
        selected: speech.selected_voice(),
    })
}

async fn select_voice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectVoiceRequest>,
) -> Result<Json<VoicesResponse>, ApiError> {
    state
        .dialog
        .speech()
        .set_voice(&request.voice_id)
        .map_err(|_| ApiError::UnknownVoice(request.voice_id.clone()))?;
    Ok(voices(State(state)).await)
}
