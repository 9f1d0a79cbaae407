//! Normalizer — one canonical `JobRecord` per raw posting. Never fails.

use crate::models::job::{IdentityKey, JobRecord, UNKNOWN};
use crate::models::posting::RawPosting;
use crate::pipeline::extract::{
    details_apply_link, details_pay, details_posted_text, extract_apply_link, extract_pay,
    extract_posted_text, fallback_apply_link,
};
use crate::pipeline::recency::posted_recency;

/// True when the posting has an id and is missing pay, posted text, or apply link,
/// i.e. a details lookup could fill a gap.
pub fn needs_details(posting: &RawPosting) -> bool {
    posting.job_id.is_some()
        && (extract_pay(posting).is_none()
            || extract_posted_text(posting).is_none()
            || extract_apply_link(posting).is_none())
}

/// Builds the record for `posting`. `details` only fills fields the posting lacks.
pub fn normalize(posting: &RawPosting, details: Option<&RawPosting>) -> JobRecord {
    let title = or_unknown(posting.title.clone());
    let company = or_unknown(posting.company_name.clone());
    let location = or_unknown(posting.location.clone());

    let pay = extract_pay(posting).or_else(|| details.and_then(details_pay));
    let posted_text =
        extract_posted_text(posting).or_else(|| details.and_then(details_posted_text));
    let apply_link = extract_apply_link(posting)
        .or_else(|| details.and_then(details_apply_link))
        .unwrap_or_else(|| fallback_apply_link(&title, &company));
    let source = posting
        .via
        .clone()
        .or_else(|| details.and_then(|d| d.via.clone()));

    let identity = match &posting.job_id {
        Some(id) => IdentityKey::ProviderId(id.clone()),
        None => IdentityKey::composite(&title, &company, &location),
    };

    JobRecord {
        identity,
        title,
        company,
        location,
        pay: or_unknown(pay),
        posted: posted_recency(&or_unknown(posted_text)),
        source: or_unknown(source),
        apply_link,
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
