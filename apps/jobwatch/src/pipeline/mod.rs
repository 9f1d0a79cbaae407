// Job-posting pipeline: extraction, recency parsing, relevance filtering,
// normalization, deduplication, and the driver that ties them together.
// All network access goes through the `JobSource` trait.

pub mod dedup;
pub mod driver;
pub mod extract;
pub mod normalize;
pub mod queries;
pub mod recency;
pub mod relevance;
pub mod source;
