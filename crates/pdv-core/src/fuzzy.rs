//! # Fuzzy Matcher
//!
//! Jaro-Winkler similarity used as a fallback when a typed query is neither
//! a product id nor a barcode.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query ──► exact id? ──► exact barcode? ──► best_match(names) ≥ 0.7    │
//! │               │              │                    │                    │
//! │               ▼              ▼                    ▼                    │
//! │            product        product          product / nothing           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pdv_core::fuzzy::{similarity, MATCH_THRESHOLD};
//!
//! assert_eq!(similarity("arroz", "arroz"), 1.0);
//! assert!(similarity("MARTHA", "MARHTA") > MATCH_THRESHOLD);
//! ```

/// Minimum score for two strings to count as a match.
pub const MATCH_THRESHOLD: f64 = 0.7;

/// Longest common prefix that earns the Winkler boost.
const MAX_PREFIX: usize = 4;

/// Winkler prefix scale.
const PREFIX_SCALE: f64 = 0.1;

/// Jaro similarity in [0, 1].
pub fn jaro(a: &str, b: &str) -> f64 {
    strsim::jaro(a, b)
}

/// Jaro-Winkler similarity in [0, 1].
///
/// Both strings empty score 1.0; exactly one empty scores 0.0. Comparison is
/// case-sensitive; callers lowercase when they need otherwise.
pub fn similarity(a: &str, b: &str) -> f64 {
    let jaro = strsim::jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();

    let score = jaro + prefix as f64 * PREFIX_SCALE * (1.0 - jaro);
    score.clamp(0.0, 1.0)
}

/// True when `similarity(a, b)` reaches [`MATCH_THRESHOLD`].
pub fn is_match(a: &str, b: &str) -> bool {
    similarity(a, b) >= MATCH_THRESHOLD
}

/// Returns the candidate with the highest case-insensitive score at or above
/// the threshold, together with that score.
///
/// Ties keep the earliest candidate.
pub fn best_match<'a, T, F>(query: &str, candidates: &'a [T], key: F) -> Option<(&'a T, f64)>
where
    F: Fn(&T) -> &str,
{
    let query = query.trim().to_lowercase();
    let mut best: Option<(&'a T, f64)> = None;

    for candidate in candidates {
        let score = similarity(&query, &key(candidate).to_lowercase());
        if score < MATCH_THRESHOLD {
            continue;
        }
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best
}

/// Scores every candidate and returns those at or above the threshold,
/// best first.
pub fn rank<'a, T, F>(query: &str, candidates: &'a [T], key: F) -> Vec<(&'a T, f64)>
where
    F: Fn(&T) -> &str,
{
    let query = query.trim().to_lowercase();
    let mut ranked: Vec<(&'a T, f64)> = candidates
        .iter()
        .map(|c| (c, similarity(&query, &key(c).to_lowercase())))
        .filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_identical() {
        assert_eq!(similarity("feijão", "feijão"), 1.0);
    }

    #[test]
    fn test_reference_values() {
        assert!(approx(jaro("MARTHA", "MARHTA"), 0.944));
        assert!(approx(similarity("MARTHA", "MARHTA"), 0.961));
        assert!(approx(jaro("DIXON", "DICKSONX"), 0.767));
        assert!(approx(similarity("DIXON", "DICKSONX"), 0.813));
    }

    #[test]
    fn test_prefix_boost_applies_below_threshold() {
        // Jaro 0.667 alone misses the threshold; the shared prefix lifts it
        assert!(approx(jaro("abcdxyzw", "abcdqrst"), 0.667));
        assert!(approx(similarity("abcdxyzw", "abcdqrst"), 0.8));
        assert!(is_match("abcdxyzw", "abcdqrst"));
    }

    #[test]
    fn test_agrees_with_jaro_winkler_above_threshold() {
        for (a, b) in [("MARTHA", "MARHTA"), ("DIXON", "DICKSONX"), ("feijão", "feijao")] {
            assert!(approx(similarity(a, b), strsim::jaro_winkler(a, b)));
        }
    }

    #[test]
    fn test_no_common_characters() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_single_characters() {
        // Window clamps at zero for short strings
        assert_eq!(similarity("a", "a"), 1.0);
        assert_eq!(similarity("a", "b"), 0.0);
    }

    #[test]
    fn test_best_match_is_case_insensitive() {
        let names = ["Arroz Tio João 5kg", "Feijão Carioca 1kg", "Café Pilão 500g"];
        let (found, score) = best_match("cafe pilao 500g", &names, |n| n).unwrap();
        assert_eq!(*found, "Café Pilão 500g");
        assert!(score >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_best_match_below_threshold() {
        let names = ["Arroz", "Feijão"];
        assert!(best_match("detergente", &names, |n| n).is_none());
    }

    #[test]
    fn test_rank_orders_by_score() {
        let names = ["Coca Cola 2L", "Coca Cola 350ml", "Guaraná"];
        let ranked = rank("coca cola 2l", &names, |n| n);
        assert_eq!(*ranked[0].0, "Coca Cola 2L");
        assert!(ranked.iter().all(|(n, _)| n.starts_with("Coca")));
    }

    #[test]
    fn test_is_match() {
        assert!(is_match("sabonete", "sabonet"));
        assert!(!is_match("sabonete", "vassoura"));
    }
}
