use std::sync::Arc;

use crate::config::Config;
use crate::notify::Notifier;
use crate::pipeline::source::JobSource;
use crate::report::ReportWriter;

/// Collaborators for a single run, assembled once in `main`.
pub struct AppState {
    pub config: Config,
    /// Job search backend. Default: `SerpApiClient`.
    pub source: Arc<dyn JobSource>,
    pub report_writer: Box<dyn ReportWriter + Send + Sync>,
    /// Delivery channel for the finished report. Default: `LogNotifier`.
    pub notifier: Arc<dyn Notifier>,
}
