//! Field extractor — best-effort pay, posted-recency text, and apply link.
//!
//! Each extractor returns `None` when nothing usable is found; the normalizer
//! is responsible for substituting sentinels and fallbacks.

use crate::models::posting::{PostingLink, RawPosting};

const PAY_MARKERS: &[&str] = &["$", "€", "£", "hour", "year"];
const POSTED_MARKERS: &[&str] = &["ago", "today", "yesterday", "just posted"];
const URI_SCHEMES: &[&str] = &["https://", "http://"];

/// Structured salary first, else the first extension string that looks like pay.
pub fn extract_pay(posting: &RawPosting) -> Option<String> {
    posting
        .detected_extensions
        .salary
        .clone()
        .or_else(|| scan_extensions(&posting.extensions, PAY_MARKERS))
}

/// Structured posted-at first, else the first extension string that reads like an age.
pub fn extract_posted_text(posting: &RawPosting) -> Option<String> {
    posting
        .detected_extensions
        .posted_at
        .clone()
        .or_else(|| scan_extensions(&posting.extensions, POSTED_MARKERS))
}

/// The first related link, if it is a well-formed http(s) URI.
pub fn extract_apply_link(posting: &RawPosting) -> Option<String> {
    first_valid_link(&posting.related_links)
}

/// Details responses only carry structured salary, never free-text pay.
pub fn details_pay(details: &RawPosting) -> Option<String> {
    details.detected_extensions.salary.clone()
}

pub fn details_posted_text(details: &RawPosting) -> Option<String> {
    details.detected_extensions.posted_at.clone()
}

/// The first apply option of a details response.
pub fn details_apply_link(details: &RawPosting) -> Option<String> {
    first_valid_link(&details.apply_options)
}

/// Web-search URI over title and company. Always well-formed.
pub fn fallback_apply_link(title: &str, company: &str) -> String {
    let query = format!("{title} {company} apply");
    format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(query.trim())
    )
}

pub fn is_well_formed_link(link: &str) -> bool {
    let lower = link.trim().to_ascii_lowercase();
    URI_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

fn first_valid_link(links: &[PostingLink]) -> Option<String> {
    links
        .first()
        .and_then(|l| l.link.as_deref())
        .filter(|link| is_well_formed_link(link))
        .map(|link| link.trim().to_string())
}

fn scan_extensions(extensions: &[String], markers: &[&str]) -> Option<String> {
    extensions
        .iter()
        .find(|item| {
            let lower = item.to_lowercase();
            markers.iter().any(|m| lower.contains(m))
        })
        .cloned()
}
