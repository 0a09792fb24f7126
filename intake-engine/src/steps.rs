use crate::error::{IntakeError, IntakeResult};
use crate::record::IntakeField;

/// Predicate a transcript must satisfy before a step may advance
pub type StepValidator = fn(&str) -> bool;

/// One prompt of the intake dialogue
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub prompt: String,
    /// Spoken when the validator rejects a transcript
    pub retry_prompt: String,
    pub field: IntakeField,
    pub validator: Option<StepValidator>,
}

impl StepDescriptor {
    pub fn new(field: IntakeField, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            retry_prompt: prompt.clone(),
            prompt,
            field,
            validator: None,
        }
    }

    pub fn with_retry_prompt(mut self, retry_prompt: impl Into<String>) -> Self {
        self.retry_prompt = retry_prompt.into();
        self
    }

    pub fn with_validator(mut self, validator: StepValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn accepts(&self, transcript: &str) -> bool {
        self.validator.map_or(true, |validate| validate(transcript))
    }
}

/// Fixed, ordered step sequence. Symptoms must be collected last.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<StepDescriptor>,
}

impl StepSequence {
    pub fn new(steps: Vec<StepDescriptor>) -> IntakeResult<Self> {
        match steps.last() {
            Some(last) if last.field == IntakeField::Symptoms => {}
            _ => {
                return Err(IntakeError::Config(
                    "the symptom step must be the last step".to_string(),
                ))
            }
        }
        let symptom_steps = steps
            .iter()
            .filter(|s| s.field == IntakeField::Symptoms)
            .count();
        if symptom_steps != 1 {
            return Err(IntakeError::Config(
                "exactly one symptom step is required".to_string(),
            ));
        }
        Ok(Self { steps })
    }

    /// age → gender → region → symptoms
    pub fn standard() -> Self {
        Self {
            steps: vec![
                StepDescriptor::new(IntakeField::Age, "How old are you?")
                    .with_retry_prompt("Sorry, I need your age as a number. How old are you?")
                    .with_validator(|t| parse_age(t).is_some()),
                StepDescriptor::new(
                    IntakeField::Gender,
                    "What is your gender? Male, female, or other.",
                ),
                StepDescriptor::new(IntakeField::Region, "Which region are you in?"),
                StepDescriptor::new(
                    IntakeField::Symptoms,
                    "Please tell me your symptoms. Say submit when you are done.",
                ),
            ],
        }
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }
}

impl Default for StepSequence {
    fn default() -> Self {
        Self::standard()
    }
}

pub const MAX_AGE: u32 = 120;

/// Parse a spoken age: digits ("32", "32 years") or English number words
/// ("thirty two", "one hundred and five"). Out-of-range ages are rejected.
pub fn parse_age(transcript: &str) -> Option<u8> {
    let cleaned = transcript
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    let cleaned = strip_age_suffix(&cleaned);

    let value = cleaned
        .parse::<u32>()
        .ok()
        .or_else(|| parse_number_words(cleaned))?;
    if value > MAX_AGE {
        return None;
    }
    u8::try_from(value).ok()
}

fn strip_age_suffix(text: &str) -> &str {
    let mut text = text.trim();
    for prefix in ["i am ", "i'm ", "age "] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim();
        }
    }
    for suffix in [" years old", " years", " year old", " yrs"] {
        if let Some(rest) = text.strip_suffix(suffix) {
            return rest.trim();
        }
    }
    text
}

fn unit_value(word: &str) -> Option<u32> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        _ => return None,
    };
    Some(value)
}

fn tens_value(word: &str) -> Option<u32> {
    let value = match word {
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

/// English number words up to the hundreds
pub fn parse_number_words(text: &str) -> Option<u32> {
    let words: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty() && *w != "and")
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    let mut current: u32 = 0;
    let mut last_was_tens = false;
    for word in words {
        if let Some(unit) = unit_value(word) {
            if current % 10 != 0 || (current != 0 && !last_was_tens && current % 100 != 0) {
                return None;
            }
            if last_was_tens && unit >= 10 {
                return None;
            }
            current += unit;
            last_was_tens = false;
        } else if let Some(tens) = tens_value(word) {
            if current % 100 != 0 {
                return None;
            }
            current += tens;
            last_was_tens = true;
        } else if word == "hundred" {
            if current == 0 || current >= 10 {
                return None;
            }
            total += current * 100;
            current = 0;
            last_was_tens = false;
        } else {
            return None;
        }
    }
    Some(total + current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_ages() {
        assert_eq!(parse_age("32"), Some(32));
        assert_eq!(parse_age(" 32. "), Some(32));
        assert_eq!(parse_age("32 years old"), Some(32));
        assert_eq!(parse_age("I am 7"), Some(7));
        assert_eq!(parse_age("0"), Some(0));
    }

    #[test]
    fn test_word_ages() {
        assert_eq!(parse_age("thirty two"), Some(32));
        assert_eq!(parse_age("Ninety-nine"), Some(99));
        assert_eq!(parse_age("seventeen"), Some(17));
        assert_eq!(parse_age("one hundred and five"), Some(105));
        assert_eq!(parse_age("forty"), Some(40));
    }

    #[test]
    fn test_rejected_ages() {
        assert_eq!(parse_age("banana"), None);
        assert_eq!(parse_age(""), None);
        assert_eq!(parse_age("121"), None);
        assert_eq!(parse_age("-4"), None);
        assert_eq!(parse_age("two hundred"), None);
        assert_eq!(parse_age("thirty twelve"), None);
        assert_eq!(parse_age("five six"), None);
    }

    #[test]
    fn test_standard_sequence_order() {
        let steps = StepSequence::standard();
        let fields: Vec<IntakeField> = steps.iter().map(|s| s.field).collect();
        assert_eq!(
            fields,
            vec![
                IntakeField::Age,
                IntakeField::Gender,
                IntakeField::Region,
                IntakeField::Symptoms
            ]
        );
        assert!(StepSequence::new(steps.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_age_validator_attached() {
        let steps = StepSequence::standard();
        let age = steps.get(0).unwrap();
        assert!(age.accepts("32"));
        assert!(!age.accepts("banana"));
        assert!(steps.get(1).unwrap().accepts("anything"));
    }

    #[test]
    fn test_symptom_step_must_be_last() {
        let err = StepSequence::new(vec![
            StepDescriptor::new(IntakeField::Symptoms, "symptoms?"),
            StepDescriptor::new(IntakeField::Age, "age?"),
        ])
        .unwrap_err();
        assert!(matches!(err, IntakeError::Config(_)));
        assert!(StepSequence::new(Vec::new()).is_err());
    }
}
