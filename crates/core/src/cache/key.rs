//! Cache key normalization.

/// Normalize a query into its cache key.
///
/// Lowercases the query and collapses every whitespace run into a single
/// hyphen. Runs at either end are dropped, so surrounding padding does not
/// produce a distinct key.
pub fn normalize_key(query: &str) -> String {
    query.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}
