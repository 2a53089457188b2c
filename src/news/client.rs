//! News lookup service
//!
//! The default implementation talks to a newsdata.io-style endpoint:
//! `GET {base}?apikey=&country=&language=` answering `{ "results": [...] }`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::NewsConfig;
use crate::{Error, Result};

/// One article from the news service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Headline
    #[serde(default)]
    pub title: Option<String>,
    /// Summary
    #[serde(default)]
    pub description: Option<String>,
    /// Lead image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Publisher identifier
    #[serde(default)]
    pub source_id: Option<String>,
    /// Link to the full story
    #[serde(default)]
    pub link: Option<String>,
}

/// Remote source of recent articles per country
#[async_trait]
pub trait NewsService: Send + Sync {
    /// Latest articles for `country` (a two-letter lookup key)
    ///
    /// An empty list is a normal answer, not an error.
    async fn latest(&self, country: &str) -> Result<Vec<NewsArticle>>;
}

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    #[serde(default)]
    results: Option<Vec<NewsArticle>>,
}

/// Client for the newsdata.io `news` endpoint
pub struct NewsDataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    language: String,
}

impl NewsDataClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &NewsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }
}

impl std::fmt::Debug for NewsDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsDataClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NewsService for NewsDataClient {
    async fn latest(&self, country: &str) -> Result<Vec<NewsArticle>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::News("NEWSDATA_API_KEY not configured".to_string()))?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apikey", api_key.expose_secret()),
                ("country", country),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let response = response.error_for_status()?;
        let body: NewsDataResponse = response.json().await?;

        let articles = body.results.unwrap_or_default();
        tracing::debug!(country, count = articles.len(), "news fetched");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Json;
    use axum::extract::Query;
    use axum::routing::get;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/1/news")
    }

    fn config(base_url: String, api_key: Option<&str>) -> NewsConfig {
        NewsConfig {
            api_key: api_key.map(SecretString::from),
            base_url,
            language: "en".to_string(),
            max_items: 6,
        }
    }

    #[tokio::test]
    async fn sends_country_and_parses_results() {
        let router = axum::Router::new().route(
            "/api/1/news",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "status": "success",
                    "results": [{
                        "title": format!("{}-{}-{}", params["apikey"], params["country"], params["language"]),
                        "description": null,
                        "link": "https://example.com/a"
                    }]
                }))
            }),
        );
        let base = serve(router).await;

        let client = NewsDataClient::new(&config(base, Some("key")));
        let articles = client.latest("fr").await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("key-fr-en"));
        assert_eq!(articles[0].description, None);
        assert_eq!(articles[0].link.as_deref(), Some("https://example.com/a"));
    }

    #[tokio::test]
    async fn missing_results_is_empty() {
        let router = axum::Router::new().route(
            "/api/1/news",
            get(|| async { Json(json!({ "status": "success" })) }),
        );
        let base = serve(router).await;

        let client = NewsDataClient::new(&config(base, Some("key")));
        assert!(client.latest("in").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let router = axum::Router::new().route(
            "/api/1/news",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, Json(Value::Null)) }),
        );
        let base = serve(router).await;

        let client = NewsDataClient::new(&config(base, Some("bad")));
        assert!(matches!(client.latest("in").await, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn failed_request_does_not_reveal_key() {
        let router = axum::Router::new().route(
            "/api/1/news",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Null)) }),
        );
        let base = serve(router).await;

        let client = NewsDataClient::new(&config(base, Some("SUPERSECRETKEY")));
        let err = client.latest("fr").await.unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(err.to_string().contains("500"));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
        assert!(!format!("{client:?}").contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let client = NewsDataClient::new(&config("http://127.0.0.1:9".to_string(), None));
        assert!(matches!(client.latest("in").await, Err(Error::News(_))));
    }
}
