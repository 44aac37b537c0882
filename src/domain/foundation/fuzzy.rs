//! Fuzzy matching for free-text names (doctors, pets, breeds).
//!
//! Users rarely type names exactly as the CRM stores them, so matching runs
//! in tiers: exact, substring containment, prefix, then edit-distance
//! similarity with a floor of 0.3. The highest-scoring candidate wins.

/// Similarity below this ratio is treated as no match.
const SIMILARITY_FLOOR: f64 = 0.3;

/// Levenshtein edit distance over Unicode scalar values.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity ratio in `[0, 1]`: 1.0 means identical strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Score for one candidate against the query, both lowercased.
fn match_score(query: &str, candidate: &str) -> f64 {
    if candidate == query {
        return 1.0;
    }
    if candidate.contains(query) || query.contains(candidate) {
        return 0.9;
    }
    if candidate.starts_with(query) || query.starts_with(candidate) {
        return 0.8;
    }
    let ratio = similarity(query, candidate);
    if ratio > SIMILARITY_FLOOR {
        ratio
    } else {
        0.0
    }
}

/// Finds the best-matching item for a free-text query.
///
/// Returns `None` when no candidate clears the similarity floor. Ties keep
/// the earliest candidate, so caller-supplied ordering is a priority order.
pub fn best_match<'a, T, F>(query: &str, items: &'a [T], name: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(&'a T, f64)> = None;
    for item in items {
        let score = match_score(&query, &name(item).trim().to_lowercase());
        if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((item, score));
        }
    }

    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_handles_empty_and_identical() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("кот", "кот"), 0);
    }

    #[test]
    fn levenshtein_counts_cyrillic_chars_not_bytes() {
        assert_eq!(levenshtein("кот", "кит"), 1);
    }

    #[test]
    fn exact_match_beats_everything() {
        let names = vec!["британец длинношерстный", "британец"];
        let found = best_match("британец", &names, |n| n).unwrap();
        assert_eq!(*found, "британец");
    }

    #[test]
    fn substring_containment_matches() {
        let names = vec!["мейн-кун", "британская короткошерстная"];
        let found = best_match("британская", &names, |n| n).unwrap();
        assert_eq!(*found, "британская короткошерстная");
    }

    #[test]
    fn close_typo_matches_by_similarity() {
        let names = vec!["Иванова", "Петров"];
        let found = best_match("петровв", &names, |n| n).unwrap();
        assert_eq!(*found, "Петров");
    }

    #[test]
    fn unrelated_query_matches_nothing() {
        let names = vec!["Иванова", "Петров"];
        assert!(best_match("xyzzy123", &names, |n| n).is_none());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let names = vec!["Иванова"];
        assert!(best_match("   ", &names, |n| n).is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let names = vec!["Сидоров"];
        assert!(best_match("СИДОРОВ", &names, |n| n).is_some());
    }
}
