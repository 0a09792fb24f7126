//! Edit-distance matching of free text against a fixed vocabulary

use serde::Serialize;

use crate::catalog::Vocabulary;
use crate::corrections::CorrectionTable;

/// Levenshtein distance (unit cost insert/delete/substitute), ignoring case
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = Vec::with_capacity(b.len() + 1);
        current.push(i + 1);
        for (cb, (diagonal, up)) in b.iter().zip(previous.iter().zip(previous.iter().skip(1))) {
            let left = current.last().copied().unwrap_or(i + 1);
            let substitution = diagonal + usize::from(ca != cb);
            current.push(substitution.min(up + 1).min(left + 1));
        }
        previous = current;
    }
    previous.last().copied().unwrap_or(0)
}

/// Outcome of matching one input against a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// The vocabulary entry, or the input when nothing was close enough
    pub value: String,
    /// Distance to the nearest entry
    pub distance: usize,
    /// Whether `value` came from the vocabulary
    pub matched: bool,
}

/// Nearest entry and its distance; ties go to the earliest entry
fn nearest<'v>(input: &str, vocabulary: &'v [String]) -> Option<(&'v str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for entry in vocabulary {
        let distance = edit_distance(input, entry);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((entry.as_str(), distance)),
        }
        if distance == 0 {
            break;
        }
    }
    best
}

/// Match with a distance threshold: beyond `max_distance` the input is kept
pub fn match_within(input: &str, vocabulary: &[String], max_distance: usize) -> MatchResult {
    match nearest(input, vocabulary) {
        Some((entry, distance)) if distance <= max_distance => MatchResult {
            value: entry.to_string(),
            distance,
            matched: true,
        },
        Some((_, distance)) => MatchResult {
            value: input.to_string(),
            distance,
            matched: false,
        },
        None => MatchResult {
            value: input.to_string(),
            distance: usize::MAX,
            matched: false,
        },
    }
}

/// Closest vocabulary entry, or `input` unchanged when the best distance
/// exceeds `max_distance`
pub fn closest_match(input: &str, vocabulary: &[String], max_distance: usize) -> String {
    match_within(input, vocabulary, max_distance).value
}

/// Closest vocabulary entry regardless of distance. Used where the answer
/// must land in a fixed set (gender, region).
pub fn snap_to_vocabulary(input: &str, vocabulary: &[String]) -> MatchResult {
    match_within(input, vocabulary, usize::MAX)
}

/// Correction table pre-pass followed by edit-distance matching
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    corrections: CorrectionTable,
}

impl FuzzyMatcher {
    pub fn new(corrections: CorrectionTable) -> Self {
        Self { corrections }
    }

    pub fn corrections(&self) -> &CorrectionTable {
        &self.corrections
    }

    /// Rewrite known mis-transcriptions in `input`
    pub fn correct(&self, input: &str) -> String {
        self.corrections.apply(input)
    }

    /// Correct, then match with a threshold (symptom policy)
    pub fn match_with_threshold(
        &self,
        input: &str,
        vocabulary: &Vocabulary,
        max_distance: usize,
    ) -> MatchResult {
        let corrected = self.correct(input);
        match_within(&corrected, vocabulary.entries(), max_distance)
    }

    /// Correct, then always snap to the nearest entry (gender/region policy)
    pub fn snap(&self, input: &str, vocabulary: &Vocabulary) -> MatchResult {
        let corrected = self.correct(input);
        snap_to_vocabulary(&corrected, vocabulary.entries())
    }
}
