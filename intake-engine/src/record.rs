use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{IntakeError, IntakeResult};

/// Patient gender as accepted by the prediction model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = IntakeError;

    fn from_str(s: &str) -> IntakeResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(IntakeError::Validation(format!("unknown gender: {}", other))),
        }
    }
}

/// Field of the intake record a dialogue step fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeField {
    Age,
    Gender,
    Region,
    Symptoms,
}

impl fmt::Display for IntakeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntakeField::Age => "age",
            IntakeField::Gender => "gender",
            IntakeField::Region => "region",
            IntakeField::Symptoms => "symptoms",
        };
        f.write_str(name)
    }
}

/// Completed patient record handed to the prediction collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub age: u8,
    pub gender: Gender,
    pub region: String,
    pub symptoms: BTreeSet<String>,
}

/// Record under construction during the dialogue.
///
/// Symptoms are only ever added; the set discards duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeDraft {
    age: Option<u8>,
    gender: Option<Gender>,
    region: Option<String>,
    symptoms: BTreeSet<String>,
}

impl IntakeDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_age(&mut self, age: u8) {
        self.age = Some(age);
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = Some(gender);
    }

    pub fn set_region(&mut self, region: impl Into<String>) {
        self.region = Some(region.into());
    }

    /// Union `symptoms` into the set; returns how many were new
    pub fn add_symptoms<I, S>(&mut self, symptoms: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        symptoms
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .filter(|s| self.symptoms.insert(s.clone()))
            .count()
    }

    pub fn age(&self) -> Option<u8> {
        self.age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn symptoms(&self) -> &BTreeSet<String> {
        &self.symptoms
    }

    pub fn has_symptoms(&self) -> bool {
        !self.symptoms.is_empty()
    }

    /// Freeze the draft into a record; every field must be present
    pub fn finalize(self) -> IntakeResult<IntakeRecord> {
        let missing = |field: IntakeField| {
            IntakeError::Validation(format!("intake record is missing {}", field))
        };
        let age = self.age.ok_or_else(|| missing(IntakeField::Age))?;
        let gender = self.gender.ok_or_else(|| missing(IntakeField::Gender))?;
        let region = self.region.ok_or_else(|| missing(IntakeField::Region))?;
        if self.symptoms.is_empty() {
            return Err(missing(IntakeField::Symptoms));
        }
        Ok(IntakeRecord {
            age,
            gender,
            region,
            symptoms: self.symptoms,
        })
    }
}
