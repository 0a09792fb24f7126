use regex::{NoExpand, Regex};

use crate::error::{IntakeError, IntakeResult};

#[derive(Debug, Clone)]
struct CorrectionRule {
    pattern: Regex,
    heard: String,
    canonical: String,
}

/// Rewrites known mis-transcriptions before fuzzy matching.
///
/// Phrases match as whole words, ignoring case. Longer phrases are tried
/// first so that "cold cough" wins over a rule for "cough" alone.
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    rules: Vec<CorrectionRule>,
}

impl CorrectionTable {
    pub fn new<'a, I>(pairs: I) -> IntakeResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut rules = Vec::new();
        for (heard, canonical) in pairs {
            let heard = heard.trim();
            if heard.is_empty() {
                continue;
            }
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(heard)))
                .map_err(|e| IntakeError::Catalog(format!("bad correction '{}': {}", heard, e)))?;
            rules.push(CorrectionRule {
                pattern,
                heard: heard.to_lowercase(),
                canonical: canonical.trim().to_string(),
            });
        }
        rules.sort_by(|a, b| b.heard.len().cmp(&a.heard.len()));
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Canonical phrase for an exact (case-insensitive) heard phrase
    pub fn lookup(&self, heard: &str) -> Option<&str> {
        let heard = heard.trim().to_lowercase();
        self.rules
            .iter()
            .find(|r| r.heard == heard)
            .map(|r| r.canonical.as_str())
    }

    /// Apply every rule to `text`
    pub fn apply(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |acc, rule| {
            rule.pattern
                .replace_all(&acc, NoExpand(&rule.canonical))
                .into_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CorrectionTable {
        CorrectionTable::new([
            ("hay fever", "high fever"),
            ("cold cough", "cold and cough"),
            ("coffin", "coughing"),
        ])
        .unwrap()
    }

    #[test]
    fn test_whole_word_case_insensitive() {
        let table = table();
        assert_eq!(table.apply("I have a Hay Fever"), "I have a high fever");
        assert_eq!(table.apply("coffins"), "coffins");
        assert_eq!(table.apply("COFFIN"), "coughing");
    }

    #[test]
    fn test_multiple_rules_in_one_text() {
        let table = table();
        assert_eq!(
            table.apply("hay fever, cold cough"),
            "high fever, cold and cough"
        );
    }

    #[test]
    fn test_lookup_exact_phrase() {
        let table = table();
        assert_eq!(table.lookup(" COLD cough "), Some("cold and cough"));
        assert_eq!(table.lookup("cold"), None);
    }

    #[test]
    fn test_replacement_is_literal() {
        let table = CorrectionTable::new([("dollar", "$1 sign")]).unwrap();
        assert_eq!(table.apply("a dollar"), "a $1 sign");
    }

    #[test]
    fn test_blank_phrases_skipped() {
        let table = CorrectionTable::new([("  ", "x"), ("a", "b")]).unwrap();
        assert_eq!(table.len(), 1);
    }
}
