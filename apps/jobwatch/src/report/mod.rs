//! Report writer — renders the final record set as a spreadsheet-friendly CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::errors::AppError;
use crate::models::job::JobRecord;
use crate::pipeline::extract::is_well_formed_link;

/// Fixed column order of every report.
pub const COLUMNS: &[&str] = &[
    "title",
    "company_name",
    "pay",
    "time_posted",
    "location",
    "source",
    "apply_link",
];

/// Excel rejects longer `HYPERLINK` targets with `#VALUE!`.
const MAX_HYPERLINK_CHARS: usize = 255;

/// Lets spreadsheet tools detect UTF-8 (pay strings carry "–", "€", "£").
const UTF8_BOM: &str = "\u{FEFF}";

pub trait ReportWriter {
    /// Writes `records` in the given order and returns the artifact path.
    fn write(&self, records: &[JobRecord], date: NaiveDate) -> Result<PathBuf, AppError>;
}

pub struct CsvReportWriter {
    dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("food_quality_jobs_{}.csv", date.format("%Y-%m-%d"))
    }
}

impl ReportWriter for CsvReportWriter {
    fn write(&self, records: &[JobRecord], date: NaiveDate) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(date));
        let mut out = BufWriter::new(File::create(&path)?);

        write!(out, "{UTF8_BOM}")?;
        writeln!(out, "{}", COLUMNS.join(","))?;
        for record in records {
            writeln!(out, "{}", render_row(record))?;
        }
        out.flush()?;

        info!("Wrote {} rows to {}", records.len(), path.display());
        Ok(path)
    }
}

fn render_row(record: &JobRecord) -> String {
    [
        text_cell(&record.title),
        text_cell(&record.company),
        text_cell(&record.pay),
        text_cell(&record.posted.text),
        text_cell(&record.location),
        text_cell(&record.source),
        link_cell(&record.apply_link),
    ]
    .join(",")
}

/// Provider text is never allowed to start a formula.
fn text_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        quote(&format!("'{value}"))
    } else {
        quote(value)
    }
}

/// Links become `HYPERLINK` formulas so spreadsheet tools render them clickable.
/// Targets over Excel's limit stay plain URIs, which most tools still auto-link.
fn link_cell(link: &str) -> String {
    let target = link.trim().replace('"', "%22");
    if is_well_formed_link(link) && target.chars().count() <= MAX_HYPERLINK_CHARS {
        quote(&format!("=HYPERLINK(\"{target}\",\"Apply\")"))
    } else {
        text_cell(link.trim())
    }
}

/// RFC 4180 quoting, only when needed.
fn quote(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
