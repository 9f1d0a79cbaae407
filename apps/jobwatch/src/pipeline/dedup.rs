use std::collections::HashSet;

use crate::models::job::JobRecord;

/// Keeps the first record seen for each identity key, preserving input order.
/// Later duplicates are dropped outright, never merged into the first.
pub fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.identity.clone()))
        .collect()
}
