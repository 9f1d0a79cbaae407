use thiserror::Error;

use crate::seen::SeenStoreError;
use crate::serpapi::FetchError;

/// Application-level error type.
///
/// Only startup and output failures end up here; fetch problems degrade to
/// empty results inside the SerpApi client and never abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(#[from] std::io::Error),

    #[error("Seen store error: {0}")]
    SeenStore(#[from] SeenStoreError),

    #[error("Fetch client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable short code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Report(_) => "REPORT_ERROR",
            AppError::SeenStore(_) => "SEEN_STORE_ERROR",
            AppError::Fetch(_) => "FETCH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
