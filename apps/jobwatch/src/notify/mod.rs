//! Notifier — hands the run summary and report artifact to a delivery channel.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub total: usize,
    pub window_days: u32,
    pub report_path: PathBuf,
}

impl RunSummary {
    pub fn subject(&self) -> String {
        format!("Daily Food Quality Jobs Report - {}", self.date.format("%Y-%m-%d"))
    }

    pub fn body(&self) -> String {
        format!(
            "Hi,\n\n\
             Attached is your daily Food Industry Quality/FSQA job report (last {} days).\n\
             Total jobs found: {}\n\n\
             Columns:\n\
             title, company name, pay, time posted, location, source, link to apply\n\n\
             Note:\n\
             Pay/time may show \"unknown\" when the employer posting does not provide it.\n\
             Apply links fall back to a web search when no direct link is available.\n",
            self.window_days, self.total
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &RunSummary) -> Result<(), AppError>;
}

/// Logs the rendered message instead of delivering it.
pub struct LogNotifier {
    recipient: Option<String>,
}

impl LogNotifier {
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &RunSummary) -> Result<(), AppError> {
        info!(
            recipient = self.recipient.as_deref().unwrap_or("<none>"),
            report = %summary.report_path.display(),
            total = summary.total,
            "{}",
            summary.subject()
        );
        info!("{}", summary.body());
        Ok(())
    }
}
