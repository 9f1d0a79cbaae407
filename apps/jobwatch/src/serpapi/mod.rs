/// SerpApi client — the only module that talks to the Google Jobs search API.
///
/// Transient failures (429, any 5xx, transport errors) are retried with
/// exponential backoff. Other non-success statuses are final. Whatever happens, callers get an empty page or `None`
/// back, never an error.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::posting::RawPosting;
use crate::pipeline::source::{JobSource, SearchPage};

pub const SERPAPI_URL: &str = "https://serpapi.com/search";
const SEARCH_ENGINE: &str = "google_jobs";
const LISTING_ENGINE: &str = "google_jobs_listing";
const SEARCH_ATTEMPTS: u32 = 5;
const DETAILS_ATTEMPTS: u32 = 4;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Tunables for the client. Defaults match the production provider.
#[derive(Debug, Clone)]
pub struct SerpApiSettings {
    pub base_url: String,
    pub results_per_page: u32,
    /// First retry waits this long; each later retry doubles it.
    pub backoff_base: Duration,
    pub search_attempts: u32,
    pub details_attempts: u32,
}

impl Default for SerpApiSettings {
    fn default() -> Self {
        Self {
            base_url: SERPAPI_URL.to_string(),
            results_per_page: 50,
            backoff_base: Duration::from_secs(2),
            search_attempts: SEARCH_ATTEMPTS,
            details_attempts: DETAILS_ATTEMPTS,
        }
    }
}

#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    settings: SerpApiSettings,
}

impl SerpApiClient {
    pub fn new(api_key: String, settings: SerpApiSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            settings,
        })
    }

    /// Issues a GET against the search endpoint, retrying transient failures.
    async fn get_json(&self, params: &[(&str, String)], max_attempts: u32) -> Result<Value, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.settings.backoff_base, attempt);
                warn!(
                    "SerpApi attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .get(&self.settings.base_url)
                .query(params)
                .query(&[("api_key", self.api_key.as_str())])
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FetchError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if is_retryable(status) {
                let body = response.text().await.unwrap_or_default();
                warn!("SerpApi returned {}: {}", status, truncate(&body, 200));
                last_error = Some(FetchError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            match response.json::<Value>().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last_error = Some(FetchError::Http(e));
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::Exhausted {
            attempts: max_attempts,
        }))
    }
}

#[async_trait]
impl JobSource for SerpApiClient {
    async fn search(&self, query: &str, location: &str, page_token: Option<&str>) -> SearchPage {
        let mut params = vec![
            ("engine", SEARCH_ENGINE.to_string()),
            ("q", query.to_string()),
            ("location", location.to_string()),
            ("num", self.settings.results_per_page.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("next_page_token", token.to_string()));
        }

        match self.get_json(&params, self.settings.search_attempts).await {
            Ok(value) => parse_search_page(&value),
            Err(e) => {
                warn!("Search for {query:?} returned no data: {e}");
                SearchPage::empty()
            }
        }
    }

    async fn details(&self, job_id: &str) -> Option<RawPosting> {
        if job_id.trim().is_empty() {
            return None;
        }
        let params = [
            ("engine", LISTING_ENGINE.to_string()),
            ("job_id", job_id.to_string()),
        ];

        match self.get_json(&params, self.settings.details_attempts).await {
            Ok(value) => parse_details(&value),
            Err(e) => {
                debug!("No details for job {job_id}: {e}");
                None
            }
        }
    }
}

/// Extracts postings and the pagination token from a search response body.
pub fn parse_search_page(value: &Value) -> SearchPage {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        debug!("SerpApi reported: {message}");
    }

    let postings = value
        .get("jobs_results")
        .and_then(Value::as_array)
        .map(|jobs| jobs.iter().map(RawPosting::from).collect())
        .unwrap_or_default();

    let next_page_token = value
        .get("serpapi_pagination")
        .and_then(|p| p.get("next_page_token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    SearchPage {
        postings,
        next_page_token,
    }
}

/// An empty or non-object listing body means no details.
pub fn parse_details(value: &Value) -> Option<RawPosting> {
    match value.as_object() {
        Some(map) if !map.is_empty() => Some(RawPosting::from(value)),
        _ => None,
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base * 2^(attempt - 1)` for the given retry attempt (1-based).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << attempt.saturating_sub(1).min(16))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
