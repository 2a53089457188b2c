//! News lookup by free-text region
//!
//! [`NewsRegionResolver::resolve`] never fails: every outcome, including a
//! transport error, comes back as markup with a user-facing sentence.

mod client;
mod regions;
mod render;

use std::sync::Arc;

pub use client::{NewsArticle, NewsDataClient, NewsService};
pub use regions::{REGIONS, Region, clean_region_input, lookup_region};
pub use render::{escape_html, render_news};

/// Cards rendered per lookup unless configured otherwise
pub const MAX_NEWS_ITEMS: usize = 6;

/// Reply for input with no letters left after cleaning
pub const EMPTY_REGION_REPLY: &str = "Please provide a valid country or region name.";

/// Reply when the news service cannot be reached or understood
pub const FETCH_FAILED_REPLY: &str = "I couldn't fetch the news right now. Please try again later.";

/// Maps region names to lookups and renders the results
pub struct NewsRegionResolver {
    service: Arc<dyn NewsService>,
    max_items: usize,
}

impl NewsRegionResolver {
    /// Create a resolver over a news service
    #[must_use]
    pub fn new(service: Arc<dyn NewsService>, max_items: usize) -> Self {
        Self { service, max_items }
    }

    /// Lookup key for `free_text`, if any region matches
    #[must_use]
    pub fn lookup_key(free_text: &str) -> Option<&'static str> {
        lookup_region(&clean_region_input(free_text)).map(|r| r.code)
    }

    /// Resolve `free_text` to rendered news markup or an explanation
    pub async fn resolve(&self, free_text: &str) -> String {
        let cleaned = clean_region_input(free_text);
        if cleaned.is_empty() {
            return EMPTY_REGION_REPLY.to_string();
        }

        let Some(region) = lookup_region(&cleaned) else {
            tracing::debug!(input = %cleaned, "no region matched");
            return format!(
                "I couldn't find news for \"{cleaned}\". Please specify a major country like India, USA, Germany, etc."
            );
        };

        tracing::info!(region = region.name, code = region.code, "fetching news");
        match self.service.latest(region.code).await {
            Ok(articles) if articles.is_empty() => format!(
                "No recent news found for {cleaned}. Try another region or check back later."
            ),
            Ok(articles) => render_news(
                &cleaned,
                &articles,
                self.max_items,
                chrono::Local::now().date_naive(),
            ),
            Err(e) => {
                tracing::warn!(code = region.code, error = %e, "news lookup failed");
                FETCH_FAILED_REPLY.to_string()
            }
        }
    }
}

impl std::fmt::Debug for NewsRegionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsRegionResolver")
            .field("max_items", &self.max_items)
            .finish_non_exhaustive()
    }
}
