use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error context information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub session_id: Option<String>,
    pub step: Option<String>,
    pub additional: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    /// Render the context as a compact JSON object for structured log fields.
    pub fn to_log_field(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder_collects_fields() {
        let context = ErrorContext::new()
            .with_session_id("abc")
            .with_step("age")
            .add_context("attempt", "2");

        assert_eq!(context.session_id.as_deref(), Some("abc"));
        assert_eq!(context.step.as_deref(), Some("age"));
        assert_eq!(context.additional.get("attempt").map(String::as_str), Some("2"));

        let rendered = context.to_log_field();
        assert!(rendered.contains("\"session_id\":\"abc\""));
        assert!(rendered.contains("\"attempt\":\"2\""));
    }
}
