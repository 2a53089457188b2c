//! Gemini `generateContent` client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ChatService;
use crate::config::ChatConfig;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Chat client for the Gemini REST API
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Model this client talks to
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::Chat("GEMINI_API_KEY not configured".to_string()))?;

        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("chat error {status}: {body}")));
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Chat("response contained no text".to_string()));
        }

        tracing::debug!(model = %self.model, chars = text.len(), "chat completed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    fn client(base_url: String, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(&ChatConfig {
            api_key: api_key.map(SecretString::from),
            model: "test-model".to_string(),
            base_url,
        })
    }

    #[tokio::test]
    async fn joins_parts_of_first_candidate() {
        let router = axum::Router::new().route(
            "/v1beta/models/{call}",
            post(
                |Path(call): Path<String>,
                 uri: axum::http::Uri,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    assert_eq!(call, "test-model:generateContent");
                    assert_eq!(headers["x-goog-api-key"], "k");
                    assert!(uri.query().is_none());
                    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap().to_string();
                    Json(json!({
                        "candidates": [
                            { "content": { "parts": [{ "text": "**Echo** " }, { "text": prompt }] } },
                            { "content": { "parts": [{ "text": "ignored" }] } }
                        ]
                    }))
                },
            ),
        );
        let base = serve(router).await;

        let reply = client(base, Some("k")).complete("hi there").await.unwrap();
        assert_eq!(reply, "**Echo** hi there");
    }

    #[tokio::test]
    async fn error_status_is_chat_error() {
        let router = axum::Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;

        let err = client(base, Some("k")).complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::Chat(ref m) if m.contains("429") && m.contains("slow down")));
    }

    #[tokio::test]
    async fn empty_candidates_is_chat_error() {
        let router = axum::Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = serve(router).await;

        assert!(matches!(
            client(base, Some("k")).complete("hi").await,
            Err(Error::Chat(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_is_chat_error() {
        let err = client("http://127.0.0.1:9".to_string(), None)
            .complete("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chat(_)));
    }
}
