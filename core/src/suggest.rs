//! Typo suggestions for unknown options and subcommands.

use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a candidate to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Returns the candidates similar to `entered`, most similar first.
///
/// Candidates with equal scores keep their input order.
///
/// # Examples
///
/// ```
/// use argtree_core::typo_suggestions;
///
/// let candidates = vec!["--foo".to_string(), "--bar".to_string(), "--baz".to_string()];
/// assert_eq!(typo_suggestions("--bax", &candidates), vec!["--bar", "--baz"]);
/// assert!(typo_suggestions("--qux", &candidates).is_empty());
/// ```
pub fn typo_suggestions(entered: &str, candidates: &[String]) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|candidate| (jaro_winkler(entered, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, c)| c.clone()).collect()
}
