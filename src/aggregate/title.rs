//! Title normalization and fuzzy matching for deduplication.
//!
//! When no shared identifier links two records, they can still be the
//! same paper published through different channels. The match signal is
//! token-set similarity over normalized titles, backed by author-surname
//! overlap so that generically-titled papers ("Introduction", "A Survey
//! of X") by different people never collapse together.

use std::collections::BTreeSet;

/// Token Jaccard similarity at or above which two titles are considered
/// the same paper, provided the author check also passes.
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Lowercase a title, strip punctuation, and collapse whitespace.
pub(crate) fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard similarity of the token sets of two normalized titles.
pub(crate) fn title_similarity(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    intersection as f64 / union as f64
}

/// The surname component of an author name, lowercased.
///
/// Handles both "Ada Lovelace" and PubMed's "Lovelace A" shape: the
/// longest token wins, on the observation that initials are short and
/// surnames rarely are.
pub(crate) fn surname(name: &str) -> Option<String> {
    name.split_whitespace()
        .max_by_key(|t| t.chars().count())
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
}

/// Whether two author lists share at least one surname. Empty lists never
/// match — absence of authors is no evidence of identity.
pub(crate) fn authors_overlap(a: &[String], b: &[String]) -> bool {
    let surnames_a: BTreeSet<String> = a.iter().filter_map(|n| surname(n)).collect();
    if surnames_a.is_empty() {
        return false;
    }
    b.iter()
        .filter_map(|n| surname(n))
        .any(|s| surnames_a.contains(&s))
}

/// Whether two records look like the same paper going by title and
/// authors alone.
///
/// Exact normalized-title equality is accepted on its own; a near-match
/// additionally needs a shared author surname.
pub(crate) fn same_paper(
    title_a: &str,
    authors_a: &[String],
    title_b: &str,
    authors_b: &[String],
) -> bool {
    if title_a.is_empty() || title_b.is_empty() {
        return false;
    }
    if title_a == title_b {
        return true;
    }
    title_similarity(title_a, title_b) >= TITLE_SIMILARITY_THRESHOLD
        && authors_overlap(authors_a, authors_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(
            normalize_title("Attention Is All You Need!"),
            "attention is all you need"
        );
        assert_eq!(
            normalize_title("  Graph   Neural\tNetworks: A Review "),
            "graph neural networks a review"
        );
        assert_eq!(normalize_title("..."), "");
    }

    #[test]
    fn identical_titles_have_similarity_one() {
        let t = normalize_title("Deep Learning for Protein Folding");
        assert_eq!(title_similarity(&t, &t), 1.0);
    }

    #[test]
    fn disjoint_titles_have_similarity_zero() {
        assert_eq!(title_similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn surname_handles_both_name_orders() {
        assert_eq!(surname("Ada Lovelace").as_deref(), Some("lovelace"));
        assert_eq!(surname("Lovelace A").as_deref(), Some("lovelace"));
        assert_eq!(surname(""), None);
    }

    #[test]
    fn author_overlap_requires_shared_surname() {
        let a = vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()];
        let b = vec!["Lovelace A".to_string()];
        let c = vec!["Grace Hopper".to_string()];
        assert!(authors_overlap(&a, &b));
        assert!(!authors_overlap(&a, &c));
        assert!(!authors_overlap(&[], &b));
    }

    #[test]
    fn same_paper_on_exact_title_without_authors() {
        let t = normalize_title("A Unique and Specific Title");
        assert!(same_paper(&t, &[], &t, &[]));
    }

    #[test]
    fn near_match_needs_author_confirmation() {
        let a = normalize_title("Deep Learning for Protein Structure Prediction");
        let b = normalize_title("Deep Learning for Protein Structure Prediction Methods");
        let authors = vec!["Ada Lovelace".to_string()];
        let others = vec!["Grace Hopper".to_string()];
        assert!(same_paper(&a, &authors, &b, &authors));
        assert!(!same_paper(&a, &authors, &b, &others));
    }

    #[test]
    fn dissimilar_titles_never_match() {
        let a = normalize_title("Quantum Error Correction");
        let b = normalize_title("A Survey of Transformer Architectures");
        let authors = vec!["Ada Lovelace".to_string()];
        assert!(!same_paper(&a, &authors, &b, &authors));
    }
}
