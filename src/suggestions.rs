//! Organization-name suggestions for the topic prompt.

/// Well-known organizations offered before anything has been saved.
pub const ORGANIZATION_SUGGESTIONS: &[&str] = &[
    "Amazon",
    "Apple",
    "Bank of America",
    "Chevron",
    "Coca-Cola",
    "Costco",
    "Disney",
    "ExxonMobil",
    "Ford Motor Company",
    "General Motors",
    "Google",
    "Home Depot",
    "JPMorgan Chase",
    "Meta",
    "Microsoft",
    "Netflix",
    "Nike",
    "PepsiCo",
    "Pfizer",
    "Starbucks",
    "Target",
    "Tesla",
    "Walmart",
];

/// Candidates containing `query`, ignoring case, in candidate order. An empty
/// query matches everything.
pub fn filter_suggestions<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    candidates
        .iter()
        .map(S::as_ref)
        .filter(|candidate| needle.is_empty() || candidate.to_lowercase().contains(&needle))
        .collect()
}

/// Saved topics first, then the built-in list, without repeats.
pub fn merged_suggestions(saved_topics: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let builtin = ORGANIZATION_SUGGESTIONS.iter().map(|s| s.to_string());
    for name in saved_topics.into_iter().chain(builtin) {
        if !merged.iter().any(|existing| existing.eq_ignore_ascii_case(&name)) {
            merged.push(name);
        }
    }
    merged
}
