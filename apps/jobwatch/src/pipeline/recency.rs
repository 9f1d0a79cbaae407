//! Recency parser — turns provider phrases like "3 days ago" into a day count.
//!
//! Day granularity is used for both the window filter and the sort key.
//! Hour- and minute-level phrases collapse into day 0.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::job::{PostedRecency, STALE_DAYS, UNKNOWN};

static MINUTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:minute|min)").unwrap());
static HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:hour|hr)").unwrap());
static DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\+?\s*day").unwrap());
static WEEKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\+?\s*week").unwrap());

/// Maps a posted-recency phrase to days since posting. Smaller is more recent.
///
/// Rules, first match wins (case-insensitive):
/// - empty or `unknown` → `STALE_DAYS`
/// - "just posted" / "today" → 0
/// - "yesterday" → 1
/// - N minutes, N hours → 0
/// - N days → N
/// - N weeks → N × 7
/// - anything else → `STALE_DAYS`
pub fn parse_recency_days(text: &str) -> u32 {
    let s = text.trim().to_lowercase();
    if s.is_empty() || s == UNKNOWN {
        return STALE_DAYS;
    }
    if s.contains("just posted") || s.contains("today") {
        return 0;
    }
    if s.contains("yesterday") {
        return 1;
    }
    if MINUTES.is_match(&s) || HOURS.is_match(&s) {
        return 0;
    }
    if let Some(days) = capture_number(&DAYS, &s) {
        return days.min(STALE_DAYS);
    }
    if let Some(weeks) = capture_number(&WEEKS, &s) {
        return weeks.saturating_mul(7).min(STALE_DAYS);
    }
    STALE_DAYS
}

/// Builds the recency value for a record, keeping the original text for display.
pub fn posted_recency(text: &str) -> PostedRecency {
    PostedRecency {
        days: parse_recency_days(text),
        text: text.to_string(),
    }
}

fn capture_number(pattern: &Regex, s: &str) -> Option<u32> {
    pattern
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}
