//! Turning raw transcripts into matchable pieces

// Literal patterns, exercised by the tests below.
#![allow(clippy::expect_used)]

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Conjunctions, commas and sentence-final periods separate clauses
    static ref CLAUSE_BOUNDARY: Regex =
        Regex::new(r"(?i)\s*(?:,|;|\.(?:\s+|$)|\band\b|\bwith\b)\s*").expect("clause pattern");
    static ref LEADING_FILLER: Regex = Regex::new(
        r"(?i)^(?:(?:i\s+have|i've\s+got|i\s+am\s+having|i'm\s+having|i\s+feel|i\s+am\s+feeling|i'm\s+feeling|there\s+is|also|some|a|an|my)\s+)+"
    )
    .expect("filler pattern");
}

/// Trim whitespace and surrounding punctuation: `" Female. "` → `"Female"`
pub fn clean_answer(transcript: &str) -> &str {
    transcript
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() && c != '\'')
        .trim()
}

/// Split an utterance at "and", "with", commas, semicolons and periods.
/// Clauses are trimmed and empty ones dropped.
pub fn split_clauses(utterance: &str) -> Vec<String> {
    CLAUSE_BOUNDARY
        .split(utterance)
        .map(|clause| clean_answer(clause).to_string())
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Lower-case a clause and drop leading filler ("I have a", "also", "my")
pub fn strip_filler(clause: &str) -> String {
    let lowered = clause.trim().to_lowercase();
    LEADING_FILLER.replace(&lowered, "").trim().to_string()
}

/// Whether `clause` is one of `keywords`, ignoring case and punctuation
pub fn is_keyword(clause: &str, keywords: &[String]) -> bool {
    let clause = clean_answer(clause);
    keywords.iter().any(|k| k.eq_ignore_ascii_case(clause))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_answer() {
        assert_eq!(clean_answer("  Female. "), "Female");
        assert_eq!(clean_answer("Murang'a!"), "Murang'a");
        assert_eq!(clean_answer("..."), "");
    }

    #[test]
    fn test_split_on_conjunctions() {
        assert_eq!(
            split_clauses("hay fever and coffin"),
            vec!["hay fever", "coffin"]
        );
        assert_eq!(
            split_clauses("Headache, nausea. Fatigue with chills."),
            vec!["Headache", "nausea", "Fatigue", "chills"]
        );
    }

    #[test]
    fn test_split_keeps_words_containing_conjunctions() {
        assert_eq!(split_clauses("sandy hands"), vec!["sandy hands"]);
        assert_eq!(split_clauses("withdrawal"), vec!["withdrawal"]);
    }

    #[test]
    fn test_split_keeps_decimal_points() {
        assert_eq!(split_clauses("temperature 38.5"), vec!["temperature 38.5"]);
    }

    #[test]
    fn test_filler_removed() {
        assert_eq!(strip_filler("I have a hay fever"), "hay fever");
        assert_eq!(strip_filler("also my back pain"), "back pain");
        assert_eq!(strip_filler("cold cough"), "cold cough");
        assert_eq!(strip_filler("anxiety"), "anxiety");
    }

    #[test]
    fn test_keyword_detection() {
        let keywords = vec!["submit".to_string()];
        assert!(is_keyword("Submit.", &keywords));
        assert!(is_keyword(" submit ", &keywords));
        assert!(!is_keyword("submit it now", &keywords));
    }
}
