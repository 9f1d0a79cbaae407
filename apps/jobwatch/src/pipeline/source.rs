use async_trait::async_trait;

use crate::models::posting::RawPosting;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub postings: Vec<RawPosting>,
    /// Token for the next page, when the provider has more results.
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The job-search capability the pipeline consumes.
///
/// Both calls are infallible by signature: implementations own their retry
/// policy and degrade to an empty page / `None` once it is exhausted.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, query: &str, location: &str, page_token: Option<&str>) -> SearchPage;

    /// Supplementary lookup for a single posting id.
    async fn details(&self, job_id: &str) -> Option<RawPosting>;
}
