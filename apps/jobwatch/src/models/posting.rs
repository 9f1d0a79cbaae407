//! Raw posting — the loosely typed record returned by the job-search provider.
//!
//! The provider schema is only partially reliable: any key may be missing,
//! null, or carry an unexpected type. Every field is optional, and the struct
//! is built from a `serde_json::Value` so one malformed field never fails a
//! whole page of results.

use serde::Deserialize;
use serde_json::Value;

/// A single entry from `related_links` or `apply_options`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingLink {
    pub link: Option<String>,
}

/// The structured `detected_extensions` sub-object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedExtensions {
    pub salary: Option<String>,
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawPosting {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub via: Option<String>,
    pub description: Option<String>,
    pub related_links: Vec<PostingLink>,
    /// Only populated by the details endpoint.
    pub apply_options: Vec<PostingLink>,
    pub extensions: Vec<String>,
    pub detected_extensions: DetectedExtensions,
}

impl From<Value> for RawPosting {
    fn from(value: Value) -> Self {
        RawPosting::from(&value)
    }
}

impl From<&Value> for RawPosting {
    fn from(value: &Value) -> Self {
        let detected = value.get("detected_extensions");

        RawPosting {
            job_id: text_field(value, "job_id"),
            title: text_field(value, "title"),
            company_name: text_field(value, "company_name"),
            location: text_field(value, "location"),
            via: text_field(value, "via"),
            description: text_field(value, "description"),
            related_links: link_list(value.get("related_links")),
            apply_options: link_list(value.get("apply_options")),
            extensions: value
                .get("extensions")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            detected_extensions: DetectedExtensions {
                salary: detected.and_then(|d| scalar_field(d, "salary")),
                posted_at: detected.and_then(|d| scalar_field(d, "posted_at")),
            },
        }
    }
}

/// A non-empty string value, or `None` for anything else.
fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Like `text_field`, but numbers are accepted and stringified.
fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        _ => text_field(value, key),
    }
}

fn link_list(value: Option<&Value>) -> Vec<PostingLink> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| PostingLink {
            link: text_field(item, "link"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_posting_deserializes() {
        let value = json!({
            "job_id": "abc123",
            "title": "QA Manager",
            "company_name": "Acme Foods",
            "location": "Omaha, NE",
            "via": "via Indeed",
            "description": "HACCP and SQF oversight",
            "related_links": [{"link": "https://acme.example/jobs/1", "text": "Apply"}],
            "extensions": ["3 days ago", "Full-time", "$70K–$90K a year"],
            "detected_extensions": {"posted_at": "3 days ago", "salary": "$70K–$90K a year"}
        });

        let posting: RawPosting = serde_json::from_value(value).unwrap();
        assert_eq!(posting.job_id.as_deref(), Some("abc123"));
        assert_eq!(posting.company_name.as_deref(), Some("Acme Foods"));
        assert_eq!(posting.related_links.len(), 1);
        assert_eq!(
            posting.related_links[0].link.as_deref(),
            Some("https://acme.example/jobs/1")
        );
        assert_eq!(posting.extensions.len(), 3);
        assert_eq!(
            posting.detected_extensions.posted_at.as_deref(),
            Some("3 days ago")
        );
    }

    #[test]
    fn test_wrongly_typed_fields_become_none() {
        let value = json!({
            "job_id": 42,
            "title": ["not", "a", "string"],
            "company_name": null,
            "related_links": "https://not-a-list.example",
            "extensions": ["today", 7, null, "Full-time"],
            "detected_extensions": "garbage"
        });

        let posting = RawPosting::from(&value);
        assert!(posting.job_id.is_none());
        assert!(posting.title.is_none());
        assert!(posting.company_name.is_none());
        assert!(posting.related_links.is_empty());
        assert_eq!(posting.extensions, vec!["today", "Full-time"]);
        assert_eq!(posting.detected_extensions, DetectedExtensions::default());
    }

    #[test]
    fn test_numeric_salary_is_stringified() {
        let value = json!({"detected_extensions": {"salary": 55000}});
        let posting = RawPosting::from(&value);
        assert_eq!(posting.detected_extensions.salary.as_deref(), Some("55000"));
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let value = json!({"title": "   ", "via": ""});
        let posting = RawPosting::from(&value);
        assert!(posting.title.is_none());
        assert!(posting.via.is_none());
    }

    #[test]
    fn test_page_with_mixed_entries_deserializes() {
        let page = json!([{"title": "QA Lead"}, 17, {"job_id": "x"}]);
        let postings: Vec<RawPosting> = serde_json::from_value(page).unwrap();
        assert_eq!(postings.len(), 3);
        assert_eq!(postings[1], RawPosting::default());
    }
}
