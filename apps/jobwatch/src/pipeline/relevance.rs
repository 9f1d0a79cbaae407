//! Relevance filter — keyword heuristic for food-industry quality/FSQA postings.
//!
//! Recall matters more than precision here: provider text is sparse, so a
//! strong title alone is enough to keep a posting.

use serde::{Deserialize, Serialize};

use crate::models::posting::RawPosting;

/// Role titles searched for by default. Also the default must-keep title terms.
pub const DEFAULT_ROLE_KEYWORDS: &[&str] = &[
    "Quality Assurance Supervisor",
    "Quality Assurance Manager",
    "QA Supervisor",
    "QA Manager",
    "Quality Supervisor",
    "Quality Manager",
    "FSQ Manager",
    "FSQ Supervisor",
    "FSQ Specialist",
    "FSQA Manager",
    "FSQA Supervisor",
    "FSQA Specialist",
    "Food Safety Manager",
    "Food Safety Supervisor",
    "Quality Specialist",
    "Quality Lead",
];

/// Food-industry hints looked for anywhere in title, company, or description.
pub const DEFAULT_DOMAIN_KEYWORDS: &[&str] = &[
    "food",
    "food manufacturing",
    "food processing",
    "meat",
    "dairy",
    "bakery",
    "beverage",
    "plant",
    "production",
    "warehouse",
    "HACCP",
    "SQF",
    "FSQA",
    "GMP",
    "sanitation",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceVerdict {
    /// Title contains a must-keep term.
    TitleMatch,
    /// Title, company, or description contains a domain keyword.
    DomainMatch,
    Rejected,
}

impl RelevanceVerdict {
    pub fn is_kept(&self) -> bool {
        !matches!(self, RelevanceVerdict::Rejected)
    }
}

/// Terms are stored lowercased; matching is substring-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceFilter {
    must_keep_title_terms: Vec<String>,
    domain_keywords: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_KEYWORDS, DEFAULT_DOMAIN_KEYWORDS)
    }
}

impl RelevanceFilter {
    pub fn new<S: AsRef<str>>(must_keep_title_terms: &[S], domain_keywords: &[S]) -> Self {
        Self {
            must_keep_title_terms: lowered(must_keep_title_terms),
            domain_keywords: lowered(domain_keywords),
        }
    }

    pub fn evaluate(&self, posting: &RawPosting) -> RelevanceVerdict {
        let title = posting.title.as_deref().unwrap_or_default().to_lowercase();
        if self
            .must_keep_title_terms
            .iter()
            .any(|term| title.contains(term.as_str()))
        {
            return RelevanceVerdict::TitleMatch;
        }

        let text = [
            posting.title.as_deref(),
            posting.company_name.as_deref(),
            posting.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

        if self
            .domain_keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
        {
            RelevanceVerdict::DomainMatch
        } else {
            RelevanceVerdict::Rejected
        }
    }
}

fn lowered<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
