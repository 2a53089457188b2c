//! Image text extraction
//!
//! Uploads an image to an extraction endpoint as a multipart form
//! (`prompt`, `file`) and reads back `{ "text": "..." }`. The image is
//! checked locally before anything is sent.

use serde::Deserialize;
use thiserror::Error;

use crate::config::OcrConfig;

/// Prompt sent with an image when the user typed nothing
pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image";

/// Image types the extraction service accepts
pub const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Image text extraction failures
#[derive(Debug, Error)]
pub enum OcrError {
    /// Content type not in [`ACCEPTED_TYPES`]
    #[error("Please select a valid image file (JPEG, PNG, GIF, or WEBP)")]
    InvalidType(String),

    /// Image larger than the configured limit
    #[error("File size exceeds {}MB limit", .max / (1024 * 1024))]
    TooLarge {
        /// Image size in bytes
        size: usize,
        /// Limit in bytes
        max: usize,
    },

    /// Endpoint answered with a non-success status
    #[error("Upload failed: {0}")]
    UploadFailed(reqwest::StatusCode),

    /// Endpoint could not be reached
    #[error("Network error during upload")]
    Network(#[source] reqwest::Error),

    /// Body was not the expected JSON
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Service answered but found no text
    #[error("No text could be extracted from the image")]
    NoText,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the image text extraction endpoint
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: reqwest::Client,
    url: String,
    max_bytes: usize,
}

impl OcrClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Largest accepted image in bytes
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check type and size without uploading
    ///
    /// # Errors
    ///
    /// Returns error if the type is not accepted or the image is too large
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), OcrError> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ACCEPTED_TYPES.contains(&mime.as_str()) {
            return Err(OcrError::InvalidType(content_type.to_string()));
        }
        if size > self.max_bytes {
            return Err(OcrError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Extract text from `image`
    ///
    /// An empty or missing `prompt` is sent as [`DEFAULT_IMAGE_PROMPT`].
    ///
    /// # Errors
    ///
    /// Returns error if validation, upload or response parsing fails, or
    /// if no text came back
    pub async fn extract_text(
        &self,
        prompt: Option<&str>,
        content_type: &str,
        image: Vec<u8>,
    ) -> Result<String, OcrError> {
        self.validate(content_type, image.len())?;

        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_IMAGE_PROMPT);
        let extension = content_type
            .split(';')
            .next()
            .and_then(|m| m.trim().strip_prefix("image/"))
            .unwrap_or("bin");

        tracing::debug!(bytes = image.len(), content_type, "uploading image for text extraction");

        let file = reqwest::multipart::Part::bytes(image)
            .file_name(format!("upload.{extension}"))
            .mime_str(content_type)
            .map_err(|_| OcrError::InvalidType(content_type.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("prompt", prompt.to_string())
            .part("file", file);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::Network(e.without_url()))?;

        if !response.status().is_success() {
            return Err(OcrError::UploadFailed(response.status()));
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|_| OcrError::InvalidResponse)?;

        body.text
            .filter(|t| !t.trim().is_empty())
            .ok_or(OcrError::NoText)
    }
}
