//! Pipeline driver — query → relevance filter → normalize → dedupe → window → sort.
//!
//! Runs strictly sequentially. A run always produces an outcome: empty or
//! failed queries, and an exhausted run budget, only shrink the result set.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::job::JobRecord;
use crate::models::posting::RawPosting;
use crate::pipeline::dedup::dedupe;
use crate::pipeline::normalize::{needs_details, normalize};
use crate::pipeline::relevance::RelevanceFilter;
use crate::pipeline::source::{JobSource, SearchPage};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Immutable per-run settings, resolved once by the caller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub queries: Vec<String>,
    pub location: String,
    /// Records older than this many days are dropped.
    pub window_days: u32,
    /// Pages fetched per query, at least one.
    pub max_pages: u32,
    pub fetch_details: bool,
    /// Wall-clock cap on the fetch phase. `None` = unbounded.
    pub budget: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            location: "United States".to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            max_pages: 1,
            fetch_details: true,
            budget: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub queries_issued: usize,
    pub queries_skipped: usize,
    pub pages_fetched: usize,
    pub raw_postings: usize,
    pub relevant: usize,
    pub details_lookups: usize,
    pub duplicates_dropped: usize,
    pub stale_dropped: usize,
    pub budget_exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    /// Deduplicated, in-window, sorted most recent first.
    pub records: Vec<JobRecord>,
    pub stats: RunStats,
}

pub struct Pipeline {
    source: Arc<dyn JobSource>,
    filter: RelevanceFilter,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(source: Arc<dyn JobSource>, filter: RelevanceFilter, config: PipelineConfig) -> Self {
        Self {
            source,
            filter,
            config,
        }
    }

    pub async fn run(&self) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        async move {
            let deadline = self.config.budget.map(|budget| Instant::now() + budget);
            let mut stats = RunStats::default();
            let mut collected = Vec::new();

            info!(
                "Starting run: {} queries, location {:?}, window {} days",
                self.config.queries.len(),
                self.config.location,
                self.config.window_days
            );

            for query in &self.config.queries {
                if stats.budget_exhausted || expired(deadline) {
                    stats.budget_exhausted = true;
                    break;
                }
                stats.queries_issued += 1;
                let before = collected.len();
                self.run_query(query, deadline, &mut stats, &mut collected).await;
                info!("Query {query:?}: {} relevant postings", collected.len() - before);
            }
            stats.queries_skipped = self.config.queries.len() - stats.queries_issued;
            if stats.budget_exhausted {
                warn!(
                    "Run budget exhausted; skipped {} queries, emitting partial results",
                    stats.queries_skipped
                );
            }

            let records = finalize(collected, self.config.window_days, &mut stats);
            info!(
                "Run complete: {} records ({} duplicates, {} out of window)",
                records.len(),
                stats.duplicates_dropped,
                stats.stale_dropped
            );

            RunOutcome {
                run_id,
                records,
                stats,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_query(
        &self,
        query: &str,
        deadline: Option<Instant>,
        stats: &mut RunStats,
        collected: &mut Vec<JobRecord>,
    ) {
        let mut page_token: Option<String> = None;

        for page_no in 0..self.config.max_pages.max(1) {
            if page_no > 0 && expired(deadline) {
                stats.budget_exhausted = true;
                return;
            }

            let search = self
                .source
                .search(query, &self.config.location, page_token.as_deref());
            let Some(SearchPage {
                postings,
                next_page_token,
            }) = within_budget(deadline, search).await
            else {
                warn!("Search for {query:?} abandoned at run budget");
                stats.budget_exhausted = true;
                return;
            };
            stats.pages_fetched += 1;

            if postings.is_empty() {
                debug!("Query {query:?} page {page_no}: no postings");
                return;
            }

            for posting in &postings {
                stats.raw_postings += 1;
                let verdict = self.filter.evaluate(posting);
                if !verdict.is_kept() {
                    debug!("Dropping irrelevant posting {:?}", posting.title);
                    continue;
                }
                stats.relevant += 1;
                let details = self.lookup_details(posting, deadline, stats).await;
                collected.push(normalize(posting, details.as_ref()));
            }

            match next_page_token {
                Some(token) => page_token = Some(token),
                None => return,
            }
        }
    }

    async fn lookup_details(
        &self,
        posting: &RawPosting,
        deadline: Option<Instant>,
        stats: &mut RunStats,
    ) -> Option<RawPosting> {
        if !self.config.fetch_details || !needs_details(posting) || expired(deadline) {
            return None;
        }
        let job_id = posting.job_id.as_deref()?;
        stats.details_lookups += 1;
        within_budget(deadline, self.source.details(job_id))
            .await
            .flatten()
    }
}

/// Dedupes, drops records outside the window, and sorts ascending by age.
/// The sort is stable, so equal ages keep accumulation order.
pub fn finalize(records: Vec<JobRecord>, window_days: u32, stats: &mut RunStats) -> Vec<JobRecord> {
    let total = records.len();
    let unique = dedupe(records);
    stats.duplicates_dropped = total - unique.len();

    let before_window = unique.len();
    let mut in_window: Vec<JobRecord> = unique
        .into_iter()
        .filter(|r| !r.posted.is_stale() && r.posted.days <= window_days)
        .collect();
    stats.stale_dropped = before_window - in_window.len();

    in_window.sort_by_key(|r| r.posted.days);
    in_window
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Runs `fut` to completion, or returns `None` if the deadline passes first.
async fn within_budget<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(d) => timeout_at(d, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{IdentityKey, UNKNOWN};
    use crate::models::posting::PostingLink;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source: pages keyed by (query, page token).
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<(String, Option<String>), SearchPage>,
        details: HashMap<String, RawPosting>,
        search_delay: Option<Duration>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_page(mut self, query: &str, token: Option<&str>, page: SearchPage) -> Self {
            self.pages
                .insert((query.to_string(), token.map(str::to_string)), page);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobSource for FakeSource {
        async fn search(&self, query: &str, _location: &str, page_token: Option<&str>) -> SearchPage {
            self.calls
                .lock()
                .unwrap()
                .push(format!("search:{query}:{}", page_token.unwrap_or("-")));
            if let Some(delay) = self.search_delay {
                tokio::time::sleep(delay).await;
            }
            self.pages
                .get(&(query.to_string(), page_token.map(str::to_string)))
                .cloned()
                .unwrap_or_default()
        }

        async fn details(&self, job_id: &str) -> Option<RawPosting> {
            self.calls.lock().unwrap().push(format!("details:{job_id}"));
            self.details.get(job_id).cloned()
        }
    }

    fn posting(id: &str, title: &str, posted: &str) -> RawPosting {
        let mut p = RawPosting {
            job_id: Some(id.to_string()),
            title: Some(title.to_string()),
            company_name: Some("Acme Foods".to_string()),
            location: Some("Omaha, NE".to_string()),
            related_links: vec![PostingLink {
                link: Some(format!("https://acme.example/jobs/{id}")),
            }],
            extensions: vec!["$70K a year".to_string()],
            ..Default::default()
        };
        p.detected_extensions.posted_at = Some(posted.to_string());
        p
    }

    fn page(postings: Vec<RawPosting>) -> SearchPage {
        SearchPage {
            postings,
            next_page_token: None,
        }
    }

    fn config(queries: &[&str]) -> PipelineConfig {
        PipelineConfig {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            ..Default::default()
        }
    }

    fn pipeline(source: FakeSource, config: PipelineConfig) -> (Pipeline, Arc<FakeSource>) {
        let source = Arc::new(source);
        let pipeline = Pipeline::new(source.clone(), RelevanceFilter::default(), config);
        (pipeline, source)
    }

    #[tokio::test]
    async fn test_duplicate_and_stale_postings_are_excluded() {
        let source = FakeSource::default().with_page(
            "q",
            None,
            page(vec![
                posting("1", "QA Supervisor", "2 days ago"),
                posting("1", "QA Supervisor (repost)", "today"),
                posting("3", "QA Manager", "2 weeks ago"),
            ]),
        );
        let (pipeline, _) = pipeline(source, config(&["q"]));

        let outcome = pipeline.run().await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].identity, IdentityKey::ProviderId("1".to_string()));
        assert_eq!(outcome.records[0].title, "QA Supervisor");
        assert_eq!(outcome.stats.duplicates_dropped, 1);
        assert_eq!(outcome.stats.stale_dropped, 1);
    }

    #[tokio::test]
    async fn test_empty_query_does_not_stop_later_queries() {
        let source = FakeSource::default()
            .with_page("b", None, page(vec![posting("b1", "Quality Lead", "today")]));
        let (pipeline, source) = pipeline(source, config(&["a", "b"]));

        let outcome = pipeline.run().await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.queries_issued, 2);
        assert_eq!(source.calls(), vec!["search:a:-", "search:b:-"]);
    }

    #[tokio::test]
    async fn test_sorted_by_recency_with_stable_ties() {
        let source = FakeSource::default()
            .with_page(
                "a",
                None,
                page(vec![
                    posting("a1", "QA Manager", "5 days ago"),
                    posting("a2", "QA Manager", "yesterday"),
                ]),
            )
            .with_page(
                "b",
                None,
                page(vec![
                    posting("b1", "QA Manager", "1 day ago"),
                    posting("b2", "QA Manager", "5 hours ago"),
                    posting("b3", "QA Manager", "1 week ago"),
                ]),
            );
        let (pipeline, _) = pipeline(source, config(&["a", "b"]));

        let outcome = pipeline.run().await;
        let ids: Vec<String> = outcome
            .records
            .iter()
            .map(|r| r.identity.to_string())
            .collect();
        assert_eq!(ids, vec!["id:b2", "id:a2", "id:b1", "id:a1", "id:b3"]);
        assert!(outcome
            .records
            .windows(2)
            .all(|w| w[0].posted.days <= w[1].posted.days));
    }

    #[tokio::test]
    async fn test_irrelevant_postings_are_filtered() {
        let mut unrelated = posting("x", "Software Engineer", "today");
        unrelated.company_name = Some("Initech".to_string());
        let source = FakeSource::default().with_page(
            "q",
            None,
            page(vec![unrelated, posting("y", "QA Supervisor", "today")]),
        );
        let (pipeline, _) = pipeline(source, config(&["q"]));

        let outcome = pipeline.run().await;
        assert_eq!(outcome.stats.raw_postings, 2);
        assert_eq!(outcome.stats.relevant, 1);
        assert_eq!(outcome.records[0].identity.to_string(), "id:y");
    }

    #[tokio::test]
    async fn test_pagination_follows_tokens_up_to_limit() {
        let source = FakeSource::default()
            .with_page(
                "q",
                None,
                SearchPage {
                    postings: vec![posting("p1", "QA Manager", "today")],
                    next_page_token: Some("t2".to_string()),
                },
            )
            .with_page(
                "q",
                Some("t2"),
                SearchPage {
                    postings: vec![posting("p2", "QA Manager", "today")],
                    next_page_token: Some("t3".to_string()),
                },
            );
        let mut cfg = config(&["q"]);
        cfg.max_pages = 2;
        let (pipeline, source) = pipeline(source, cfg);

        let outcome = pipeline.run().await;
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stats.pages_fetched, 2);
        assert_eq!(source.calls(), vec!["search:q:-", "search:q:t2"]);
    }

    #[tokio::test]
    async fn test_details_fill_missing_link() {
        let mut sparse = posting("d1", "FSQA Specialist", "today");
        sparse.related_links.clear();
        let details = RawPosting {
            apply_options: vec![PostingLink {
                link: Some("https://indeed.example/viewjob?jk=d1".to_string()),
            }],
            ..Default::default()
        };
        let mut source = FakeSource::default().with_page("q", None, page(vec![sparse]));
        source.details.insert("d1".to_string(), details);
        let (pipeline, source) = pipeline(source, config(&["q"]));

        let outcome = pipeline.run().await;
        assert_eq!(outcome.records[0].apply_link, "https://indeed.example/viewjob?jk=d1");
        assert_eq!(outcome.stats.details_lookups, 1);
        assert!(source.calls().contains(&"details:d1".to_string()));
    }

    #[tokio::test]
    async fn test_details_disabled_uses_fallback_link() {
        let mut sparse = posting("d1", "FSQA Specialist", "today");
        sparse.related_links.clear();
        let source = FakeSource::default().with_page("q", None, page(vec![sparse]));
        let mut cfg = config(&["q"]);
        cfg.fetch_details = false;
        let (pipeline, source) = pipeline(source, cfg);

        let outcome = pipeline.run().await;
        assert!(outcome.records[0]
            .apply_link
            .starts_with("https://www.google.com/search?q="));
        assert_eq!(outcome.records[0].pay, "$70K a year");
        assert_eq!(source.calls(), vec!["search:q:-"]);
    }

    #[tokio::test]
    async fn test_posting_without_age_is_dropped_from_window() {
        let mut undated = posting("u", "QA Manager", "today");
        undated.detected_extensions.posted_at = None;
        let source = FakeSource::default().with_page("q", None, page(vec![undated]));
        let mut cfg = config(&["q"]);
        cfg.fetch_details = false;
        let (pipeline, _) = pipeline(source, cfg);

        let outcome = pipeline.run().await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.stale_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_emits_partial_results() {
        let mut source = FakeSource::default()
            .with_page("a", None, page(vec![posting("a1", "QA Manager", "today")]))
            .with_page("b", None, page(vec![posting("b1", "QA Manager", "today")]))
            .with_page("c", None, page(vec![posting("c1", "QA Manager", "today")]));
        source.search_delay = Some(Duration::from_secs(10));
        let mut cfg = config(&["a", "b", "c"]);
        cfg.budget = Some(Duration::from_secs(15));
        let (pipeline, source) = pipeline(source, cfg);

        let outcome = pipeline.run().await;
        assert!(outcome.stats.budget_exhausted);
        assert_eq!(outcome.stats.queries_issued, 2);
        assert_eq!(outcome.stats.queries_skipped, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].identity.to_string(), "id:a1");
        assert_eq!(source.calls(), vec!["search:a:-", "search:b:-"]);
    }

    #[tokio::test]
    async fn test_no_queries_produces_empty_outcome() {
        let (pipeline, _) = pipeline(FakeSource::default(), config(&[]));
        let outcome = pipeline.run().await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats, RunStats::default());
    }

    #[test]
    fn test_finalize_respects_window_boundary() {
        let mut stats = RunStats::default();
        let make = |id: &str, posted: &str| normalize(&posting(id, "QA Manager", posted), None);
        let records = vec![make("a", "1 week ago"), make("b", "8 days ago"), make("c", UNKNOWN)];

        let out = finalize(records, 7, &mut stats);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].posted.days, 7);
        assert_eq!(stats.stale_dropped, 2);
    }
}
