// Literal patterns, exercised by the tests below.
#![allow(clippy::expect_used)]

use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern");
    static ref PHONE_REGEX: Regex = Regex::new(
        r"(?:\+?254[\s-]?|\b0)[17]\d{2}[\s-]?\d{3}[\s-]?\d{3}\b|\(?\b[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b"
    )
    .expect("phone pattern");
    static ref NATIONAL_ID_REGEX: Regex = Regex::new(r"\b\d{7,8}\b").expect("id pattern");
    static ref IP_REGEX: Regex =
        Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("ip pattern");
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::new(RedactionConfig::default());
}

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

/// Toggle the process-wide redaction applied by [`redact_transcript`].
pub fn set_redaction_enabled(enabled: bool) {
    REDACTION_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Redact a patient transcript with the default configuration before logging it.
pub fn redact_transcript(text: &str) -> String {
    if REDACTION_ENABLED.load(Ordering::Relaxed) {
        DEFAULT_REDACTOR.redact(text)
    } else {
        text.to_string()
    }
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_national_ids: bool,
    pub redact_ip_addresses: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_national_ids: true,
            redact_ip_addresses: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// PII redactor for transcripts and log messages
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", "***@***");
        }

        // Phones before IDs: a phone number contains digit runs the ID pattern would catch.
        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(***) ***-****");
        }

        if self.config.redact_ip_addresses {
            result = self.replace(&IP_REGEX, &result, "IP", "***.***.***.***");
        }

        if self.config.redact_national_ids {
            result = self.replace(&NATIONAL_ID_REGEX, &result, "ID", "********");
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn replace(&self, pattern: &Regex, text: &str, label: &str, mask: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{}[{}]", label, hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }
}

fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_email_redaction() {
        let redacted = masking_redactor().redact("reach me at jane.doe@example.com please");
        assert_eq!(redacted, "reach me at ***@*** please");
    }

    #[test]
    fn test_kenyan_phone_redaction() {
        let redacted = masking_redactor().redact("call 0712 345 678 or +254712345678");
        assert!(!redacted.contains("345"));
        assert_eq!(redacted.matches("(***) ***-****").count(), 2);
    }

    #[test]
    fn test_national_id_redaction_keeps_ages() {
        let redacted = masking_redactor().redact("id 12345678, I am 32");
        assert_eq!(redacted, "id ********, I am 32");
    }

    #[test]
    fn test_symptoms_pass_through() {
        let text = "high fever and coughing";
        assert_eq!(masking_redactor().redact(text), text);
    }

    #[test]
    fn test_hash_for_correlation_is_stable() {
        let redactor = PiiRedactor::new(RedactionConfig::default());
        let first = redactor.redact("mail a@b.io");
        let second = redactor.redact("mail a@b.io");
        assert!(first.starts_with("mail EMAIL["));
        assert_eq!(first, second);
    }
}
