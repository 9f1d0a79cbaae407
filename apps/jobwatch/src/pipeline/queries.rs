/// Suffixes appended to every quoted role keyword. Broad queries pull in more
/// postings; the relevance filter narrows them back to the food industry.
pub const QUERY_SUFFIXES: &[&str] = &[
    "food",
    "food manufacturing",
    "food processing",
    "HACCP",
    "SQF",
    "FSQA",
];

/// Expands role keywords into search queries, role order first, then suffix order.
pub fn build_queries<S: AsRef<str>>(roles: &[S]) -> Vec<String> {
    roles
        .iter()
        .map(|role| role.as_ref().trim())
        .filter(|role| !role.is_empty())
        .flat_map(|role| {
            QUERY_SUFFIXES
                .iter()
                .map(move |suffix| format!("\"{role}\" {suffix}"))
        })
        .collect()
}
