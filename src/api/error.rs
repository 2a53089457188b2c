//! API error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ocr::OcrError;

/// Errors returned by API handlers as `{ "error": { "code", "message" } }`
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or empty request
    BadRequest(String),
    /// Voice id not in the catalog
    UnknownVoice(String),
    /// Image type not accepted
    UnsupportedMedia(String),
    /// Image over the size limit
    PayloadTooLarge(String),
    /// Extraction service failed
    Upstream(String),
}

impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::InvalidType(_) => Self::UnsupportedMedia(err.to_string()),
            OcrError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            OcrError::UploadFailed(_)
            | OcrError::Network(_)
            | OcrError::InvalidResponse
            | OcrError::NoText => Self::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::UnknownVoice(id) => (
                StatusCode::BAD_REQUEST,
                "unknown_voice",
                format!("unknown voice: {id}"),
            ),
            Self::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg,
            ),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, "extraction_failed", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
