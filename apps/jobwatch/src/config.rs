use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::AppError;
use crate::pipeline::driver::{PipelineConfig, DEFAULT_WINDOW_DAYS};
use crate::pipeline::queries::build_queries;
use crate::pipeline::relevance::{RelevanceFilter, DEFAULT_DOMAIN_KEYWORDS, DEFAULT_ROLE_KEYWORDS};
use crate::serpapi::SerpApiSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup, before any network activity, if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub serpapi_key: String,
    pub location: String,
    pub role_keywords: Vec<String>,
    pub domain_keywords: Vec<String>,
    pub must_keep_title_terms: Vec<String>,
    pub window_days: u32,
    pub max_pages: u32,
    pub results_per_page: u32,
    pub run_budget: Option<Duration>,
    pub fetch_details: bool,
    pub report_dir: PathBuf,
    pub seen_store_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub notify_recipient: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let role_keywords = list_or(get("ROLE_KEYWORDS"), DEFAULT_ROLE_KEYWORDS);
        let must_keep_title_terms = match get("MUST_KEEP_TITLE_TERMS") {
            Some(raw) => split_list(&raw),
            None => role_keywords.clone(),
        };

        let window_days = parse_or(get("RECENCY_WINDOW_DAYS"), "RECENCY_WINDOW_DAYS", DEFAULT_WINDOW_DAYS)?;
        let max_pages = parse_or(get("MAX_PAGES"), "MAX_PAGES", 1u32)?;
        let results_per_page = parse_or(get("RESULTS_PER_PAGE"), "RESULTS_PER_PAGE", 50u32)?;
        if max_pages == 0 || results_per_page == 0 {
            return Err(AppError::Config("MAX_PAGES and RESULTS_PER_PAGE must be positive".to_string()).into());
        }

        let run_budget = get("RUN_BUDGET_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("RUN_BUDGET_SECS must be a whole number of seconds, got '{raw}'"))
            })
            .transpose()?
            .map(Duration::from_secs);

        let fetch_details = match get("FETCH_DETAILS") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::Config(format!("FETCH_DETAILS must be true or false, got '{raw}'")))?,
            None => true,
        };

        let serpapi_key = get("SERPAPI_KEY")
            .with_context(|| "Required environment variable 'SERPAPI_KEY' is not set".to_string())?;

        Ok(Config {
            serpapi_key,
            location: get("JOB_LOCATION").unwrap_or_else(|| "United States".to_string()),
            role_keywords,
            domain_keywords: list_or(get("DOMAIN_KEYWORDS"), DEFAULT_DOMAIN_KEYWORDS),
            must_keep_title_terms,
            window_days,
            max_pages,
            results_per_page,
            run_budget,
            fetch_details,
            report_dir: get("REPORT_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            seen_store_path: get("SEEN_STORE_PATH").map(PathBuf::from),
            redis_url: get("REDIS_URL"),
            notify_recipient: get("NOTIFY_RECIPIENT"),
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            queries: build_queries(&self.role_keywords),
            location: self.location.clone(),
            window_days: self.window_days,
            max_pages: self.max_pages,
            fetch_details: self.fetch_details,
            budget: self.run_budget,
        }
    }

    pub fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::new(&self.must_keep_title_terms, &self.domain_keywords)
    }

    pub fn serpapi_settings(&self) -> SerpApiSettings {
        SerpApiSettings {
            results_per_page: self.results_per_page,
            ..Default::default()
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn list_or(raw: Option<String>, default: &[&str]) -> Vec<String> {
    match raw.map(|r| split_list(&r)) {
        Some(list) if !list.is_empty() => list,
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
