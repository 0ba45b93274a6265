//! Paginated person search client
//!
//! One call to [`SearchClient::fetch_page`] is exactly one HTTP request. No
//! retries happen here; the driver decides what a failure means for the run.

use crate::error::{IngestError, IngestResult};
use crate::models::RawRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// Path of the person search endpoint, relative to the API host
pub const PERSON_SEARCH_PATH: &str = "/screener/person/search";

/// Region and title filters sent with every search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub regions: Vec<String>,
    pub titles: Vec<String>,
}

/// Result of one page request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub records: Vec<RawRecord>,
    /// True when fewer records came back than were asked for.
    ///
    /// This is a heuristic: a page that is short because the API truncated
    /// it early looks the same as the genuine last page.
    pub is_last_page: bool,
    /// Total match count as reported by the API
    pub total_display_count: String,
}

impl FetchedPage {
    /// Build a page result, applying the short-page end-of-data rule
    pub fn new(records: Vec<RawRecord>, page_size: u32, total_display_count: String) -> Self {
        let is_last_page = records.len() < page_size as usize;
        Self {
            records,
            is_last_page,
            total_display_count,
        }
    }
}

/// Source of paginated search results
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Fetch one 1-based page of results
    async fn fetch_page(
        &self,
        filters: &SearchFilters,
        page: u32,
        page_size: u32,
    ) -> IngestResult<FetchedPage>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    filters: [SearchFilter<'a>; 2],
    page: u32,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct SearchFilter<'a> {
    filter_type: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a [String],
}

impl<'a> SearchRequest<'a> {
    fn new(filters: &'a SearchFilters, page: u32, limit: u32) -> Self {
        Self {
            filters: [
                SearchFilter {
                    filter_type: "CURRENT_TITLE",
                    kind: "in",
                    value: &filters.titles,
                },
                SearchFilter {
                    filter_type: "REGION",
                    kind: "in",
                    value: &filters.regions,
                },
            ],
            page,
            limit,
        }
    }
}

/// Expected response envelope; every profile must at least be an object
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    profiles: Vec<Map<String, Value>>,
    total_display_count: String,
}

/// HTTP implementation of [`SearchClient`]
pub struct HttpSearchClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSearchClient {
    /// Create a client for `base_url` authenticating with `api_key`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> IngestResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(IngestError::config("search API key is empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn search_url(&self) -> String {
        format!("{}{}", self.base_url, PERSON_SEARCH_PATH)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    #[instrument(skip(self, filters))]
    async fn fetch_page(
        &self,
        filters: &SearchFilters,
        page: u32,
        page_size: u32,
    ) -> IngestResult<FetchedPage> {
        if page < 1 {
            return Err(IngestError::invalid_argument("page number must be at least 1"));
        }
        if page_size < 1 {
            return Err(IngestError::invalid_argument("page size must be at least 1"));
        }

        let response = self
            .client
            .post(self.search_url())
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SearchRequest::new(filters, page, page_size))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::request_failed(
                Some(status.as_u16()),
                format!(
                    "{} {}",
                    status.canonical_reason().unwrap_or("Unknown Status"),
                    body.trim()
                ),
            ));
        }

        let body = response.text().await?;
        let envelope: SearchEnvelope = serde_json::from_str(&body)
            .map_err(|e| IngestError::schema_mismatch(e.to_string()))?;

        let records: Vec<RawRecord> = envelope
            .profiles
            .into_iter()
            .map(|profile| RawRecord::new(Value::Object(profile)))
            .collect();

        debug!(
            records = records.len(),
            total = %envelope.total_display_count,
            "Search page received"
        );

        Ok(FetchedPage::new(records, page_size, envelope.total_display_count))
    }
}
