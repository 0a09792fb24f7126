//! Static vocabularies used to normalise spoken answers
//!
//! The symptom list follows the symptom columns of the disease/symptom
//! dataset the prediction model was trained on, written with spaces instead
//! of underscores. Regions are the Kenyan counties.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::corrections::CorrectionTable;
use crate::error::{IntakeError, IntakeResult};

const SYMPTOMS: &[&str] = &[
    "itching", "skin rash", "nodal skin eruptions", "continuous sneezing", "shivering",
    "chills", "joint pain", "stomach pain", "acidity", "ulcers on tongue",
    "muscle wasting", "vomiting", "burning micturition", "fatigue", "weight gain",
    "anxiety", "cold hands and feet", "mood swings", "weight loss", "restlessness",
    "lethargy", "patches in throat", "irregular sugar level", "cough", "coughing",
    "cold and cough", "high fever", "mild fever", "sunken eyes", "breathlessness",
    "sweating", "dehydration", "indigestion", "headache", "yellowish skin",
    "dark urine", "nausea", "loss of appetite", "pain behind the eyes", "back pain",
    "constipation", "abdominal pain", "diarrhoea", "yellow urine", "yellowing of eyes",
    "acute liver failure", "fluid overload", "swelling of stomach", "swelled lymph nodes", "malaise",
    "blurred and distorted vision", "phlegm", "throat irritation", "redness of eyes", "sinus pressure",
    "runny nose", "congestion", "chest pain", "weakness in limbs", "fast heart rate",
    "pain during bowel movements", "pain in anal region", "bloody stool", "irritation in anus", "neck pain",
    "dizziness", "cramps", "bruising", "obesity", "swollen legs",
    "puffy face and eyes", "enlarged thyroid", "brittle nails", "excessive hunger", "drying and tingling lips",
    "slurred speech", "knee pain", "hip joint pain", "muscle weakness", "stiff neck",
    "swelling joints", "movement stiffness", "spinning movements", "loss of balance", "unsteadiness",
    "weakness of one body side", "loss of smell", "bladder discomfort", "continuous feel of urine", "passage of gases",
    "internal itching", "depression", "irritability", "muscle pain", "red spots over body",
    "belly pain", "abnormal menstruation", "watering from eyes", "increased appetite", "polyuria",
    "mucoid sputum", "rusty sputum", "lack of concentration", "visual disturbances", "coma",
    "stomach bleeding", "distention of abdomen", "blood in sputum", "prominent veins on calf", "palpitations",
    "painful walking", "pus filled pimples", "blackheads", "skin peeling", "small dents in nails",
    "inflammatory nails", "blister", "red sore around nose", "yellow crust ooze", "sore throat",
];

const REGIONS: &[&str] = &[
    "Nairobi", "Mombasa", "Kwale", "Kilifi", "Tana River", "Lamu", "Taita Taveta",
    "Garissa", "Wajir", "Mandera", "Marsabit", "Isiolo", "Meru", "Tharaka Nithi",
    "Embu", "Kitui", "Machakos", "Makueni", "Nyandarua", "Nyeri", "Kirinyaga",
    "Murang'a", "Kiambu", "Turkana", "West Pokot", "Samburu", "Trans Nzoia",
    "Uasin Gishu", "Elgeyo Marakwet", "Nandi", "Baringo", "Laikipia", "Nakuru",
    "Narok", "Kajiado", "Kericho", "Bomet", "Kakamega", "Vihiga", "Bungoma",
    "Busia", "Siaya", "Kisumu", "Homa Bay", "Migori", "Kisii", "Nyamira",
];

const GENDERS: &[&str] = &["male", "female", "other"];

/// Known mis-transcriptions of speech recognisers, keyed by what was heard
const CORRECTIONS: &[(&str, &str)] = &[
    ("hay fever", "high fever"),
    ("hi fever", "high fever"),
    ("cold cough", "cold and cough"),
    ("coffin", "coughing"),
    ("coughin", "coughing"),
    ("had ache", "headache"),
    ("head egg", "headache"),
    ("vomit in", "vomiting"),
    ("diarrhea", "diarrhoea"),
    ("dire rear", "diarrhoea"),
    ("chess pain", "chest pain"),
    ("fat teak", "fatigue"),
    ("nor shia", "nausea"),
    ("it ching", "itching"),
    ("skin rush", "skin rash"),
    ("breath lessness", "breathlessness"),
];

/// Ordered, non-empty sequence of canonical names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    entries: Vec<String>,
}

impl Vocabulary {
    pub fn new<I, S>(entries: I) -> IntakeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(Into::into)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if entries.is_empty() {
            return Err(IntakeError::Catalog("vocabulary must not be empty".to_string()));
        }
        Ok(Self { entries })
    }

    fn from_static(entries: &[&str]) -> Self {
        Self {
            entries: entries.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical spelling of `name` if it is an entry, ignoring case
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = IntakeError;

    fn try_from(entries: Vec<String>) -> IntakeResult<Self> {
        Self::new(entries)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.entries
    }
}

/// On-disk shape of a replacement catalog
#[derive(Debug, Deserialize)]
struct CatalogFile {
    symptoms: Vocabulary,
    regions: Vocabulary,
    #[serde(default)]
    genders: Option<Vocabulary>,
    #[serde(default)]
    corrections: BTreeMap<String, String>,
}

/// Every static table the intake dialogue consults
#[derive(Debug, Clone)]
pub struct IntakeCatalog {
    pub symptoms: Vocabulary,
    pub regions: Vocabulary,
    pub genders: Vocabulary,
    pub corrections: CorrectionTable,
}

impl IntakeCatalog {
    /// The vocabularies and corrections shipped with the crate
    pub fn builtin() -> IntakeResult<Self> {
        Ok(Self {
            symptoms: Vocabulary::from_static(SYMPTOMS),
            regions: Vocabulary::from_static(REGIONS),
            genders: Vocabulary::from_static(GENDERS),
            corrections: CorrectionTable::new(CORRECTIONS.iter().copied())?,
        })
    }

    /// Load a catalog from JSON. Genders fall back to the built-in options.
    pub fn from_json_str(raw: &str) -> IntakeResult<Self> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| IntakeError::Catalog(format!("invalid catalog: {}", e)))?;

        let genders = file
            .genders
            .unwrap_or_else(|| Vocabulary::from_static(GENDERS));
        let corrections =
            CorrectionTable::new(file.corrections.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

        Ok(Self {
            symptoms: file.symptoms,
            regions: file.regions,
            genders,
            corrections,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> IntakeResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// The configured catalog file, or the built-in one
    pub fn load(path: Option<&Path>) -> IntakeResult<Self> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Self::builtin(),
        }
    }
}
