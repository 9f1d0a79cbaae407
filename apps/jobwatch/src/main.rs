mod config;
mod errors;
mod models;
mod notify;
mod pipeline;
mod report;
mod seen;
mod serpapi;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::job::JobRecord;
use crate::notify::{LogNotifier, RunSummary};
use crate::pipeline::driver::Pipeline;
use crate::report::CsvReportWriter;
use crate::seen::{filter_unseen, mark_seen, FileSeenStore, RedisSeenStore, SeenStore, DEFAULT_REDIS_KEY};
use crate::serpapi::SerpApiClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; missing credentials stop the process here.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobwatch v{}", env!("CARGO_PKG_VERSION"));

    let source = SerpApiClient::new(config.serpapi_key.clone(), config.serpapi_settings())
        .map_err(AppError::from)?;
    info!("SerpApi client initialized");

    let state = AppState {
        report_writer: Box::new(CsvReportWriter::new(config.report_dir.clone())),
        notifier: Arc::new(LogNotifier::new(config.notify_recipient.clone())),
        source: Arc::new(source),
        config,
    };

    let seen = open_seen_store(&state.config).await;

    if let Err(e) = run(&state, seen).await {
        error!(code = e.code(), "Run failed: {e}");
        return Err(e.into());
    }
    Ok(())
}

/// One full run. The seen store, when present, is read before the report is
/// written and only updated after the report has been written and delivered.
async fn run(state: &AppState, mut seen: Option<Box<dyn SeenStore>>) -> Result<(), AppError> {
    let config = &state.config;
    let pipeline = Pipeline::new(
        state.source.clone(),
        config.relevance_filter(),
        config.pipeline_config(),
    );

    let outcome = pipeline.run().await;
    info!(
        run_id = %outcome.run_id,
        queries_issued = outcome.stats.queries_issued,
        queries_skipped = outcome.stats.queries_skipped,
        pages_fetched = outcome.stats.pages_fetched,
        raw_postings = outcome.stats.raw_postings,
        relevant = outcome.stats.relevant,
        details_lookups = outcome.stats.details_lookups,
        budget_exhausted = outcome.stats.budget_exhausted,
        "Pipeline finished with {} records",
        outcome.records.len()
    );

    let records = match seen.as_deref_mut() {
        Some(store) => unseen_or_all(outcome.records, store).await,
        None => outcome.records,
    };

    let today = chrono::Local::now().date_naive();
    let report_path = state.report_writer.write(&records, today)?;

    let summary = RunSummary {
        date: today,
        total: records.len(),
        window_days: config.window_days,
        report_path,
    };
    state.notifier.notify(&summary).await?;

    if let Some(store) = seen.as_deref_mut() {
        if let Err(e) = mark_seen(&records, store).await {
            warn!("Report delivered but seen store not updated: {e}");
        }
    }

    Ok(())
}

/// Opens the configured seen store. Redis wins over a file path.
/// An unavailable store is logged and the run proceeds without one.
async fn open_seen_store(config: &Config) -> Option<Box<dyn SeenStore>> {
    if let Some(url) = &config.redis_url {
        match RedisSeenStore::connect(url, DEFAULT_REDIS_KEY).await {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                warn!("Seen store unavailable, reporting all records: {e}");
                None
            }
        }
    } else if let Some(path) = &config.seen_store_path {
        match FileSeenStore::open(path).await {
            Ok(store) => {
                info!("Seen store {} holds {} keys", store.path().display(), store.len());
                Some(Box::new(store))
            }
            Err(e) => {
                warn!("Seen store unavailable, reporting all records: {e}");
                None
            }
        }
    } else {
        None
    }
}

/// Drops records reported by earlier runs. A failing store reports everything.
async fn unseen_or_all(records: Vec<JobRecord>, store: &mut dyn SeenStore) -> Vec<JobRecord> {
    let fallback = records.clone();
    match filter_unseen(records, store).await {
        Ok(fresh) => fresh,
        Err(e) => {
            warn!("Seen store lookup failed, reporting all records: {e}");
            fallback
        }
    }
}
