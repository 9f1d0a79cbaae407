use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder for any field the provider did not supply.
pub const UNKNOWN: &str = "unknown";

/// Recency magnitude used for postings whose age cannot be determined.
pub const STALE_DAYS: u32 = 999;

/// The value used to decide that two postings are the same logical job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    /// Provider-assigned posting id.
    ProviderId(String),
    /// `title|company|location` when no id was supplied.
    Composite(String),
}

impl IdentityKey {
    pub fn composite(title: &str, company: &str, location: &str) -> Self {
        IdentityKey::Composite(format!("{title}|{company}|{location}"))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::ProviderId(id) => write!(f, "id:{id}"),
            IdentityKey::Composite(key) => write!(f, "composite:{key}"),
        }
    }
}

/// How long ago a posting was published, in whole days, plus the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedRecency {
    pub days: u32,
    pub text: String,
}

impl PostedRecency {
    pub fn is_stale(&self) -> bool {
        self.days >= STALE_DAYS
    }
}

/// One canonical, normalized job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub identity: IdentityKey,
    pub title: String,
    pub company: String,
    pub location: String,
    pub pay: String,
    pub posted: PostedRecency,
    pub source: String,
    pub apply_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_joins_with_pipes() {
        let key = IdentityKey::composite("QA Lead", "Acme", "Omaha, NE");
        assert_eq!(key, IdentityKey::Composite("QA Lead|Acme|Omaha, NE".to_string()));
    }

    #[test]
    fn test_provider_id_and_composite_never_collide() {
        let id = IdentityKey::ProviderId("a|b|c".to_string());
        let composite = IdentityKey::composite("a", "b", "c");
        assert_ne!(id, composite);
        assert_ne!(id.to_string(), composite.to_string());
    }

    #[test]
    fn test_stale_recency() {
        let recency = PostedRecency {
            days: STALE_DAYS,
            text: UNKNOWN.to_string(),
        };
        assert!(recency.is_stale());
    }
}
