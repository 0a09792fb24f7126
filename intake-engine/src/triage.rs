//! Urgency of a prediction and the advice that goes with it
//!
//! Everything here is derived from the predicted disease, how many symptoms
//! were reported, and the patient's age and gender. No history or location
//! data is consulted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Gender;

/// Diseases that always warrant prompt attention
pub const CRITICAL_DISEASES: &[&str] = &[
    "Heart attack",
    "Stroke",
    "Pneumonia",
    "Tuberculosis",
    "Dengue",
    "Malaria",
    "Typhoid",
    "COVID-19",
    "Hepatitis B",
    "Hepatitis C",
    "Hepatitis D",
    "Hepatitis E",
    "Alcoholic hepatitis",
];

pub const HIGH_SYMPTOM_COUNT: usize = 8;
pub const MODERATE_SYMPTOM_COUNT: usize = 5;

pub const GENERAL_WARNING_SIGNS: &[&str] = &[
    "difficulty breathing or shortness of breath",
    "chest pain or pressure",
    "severe abdominal pain",
    "sudden confusion or difficulty staying awake",
    "a fever above 39.4 degrees Celsius that does not respond to medication",
    "a severe headache with a stiff neck",
    "uncontrolled bleeding",
    "signs of severe dehydration",
];

pub const EMERGENCY_ACTION: &str = "If you experience any of these signs, seek emergency medical help immediately or call emergency services.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Moderate,
    High,
}

impl Urgency {
    /// Primary action for the patient
    pub fn advice(&self) -> &'static str {
        match self {
            Urgency::High => "Seek immediate medical attention at the nearest hospital or clinic.",
            Urgency::Moderate => {
                "Schedule a doctor appointment within two to three days and monitor your symptoms closely."
            }
            Urgency::Low => "Rest and take care of yourself, and monitor your symptoms for the next two to three days.",
        }
    }

    /// What to do, and when, from today until recovery
    pub fn timeline(&self) -> &'static [TimelineEntry] {
        match self {
            Urgency::High => HIGH_TIMELINE,
            Urgency::Moderate => MODERATE_TIMELINE,
            Urgency::Low => LOW_TIMELINE,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Low => "low",
            Urgency::Moderate => "moderate",
            Urgency::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub timeframe: &'static str,
    pub action: &'static str,
}

impl TimelineEntry {
    const fn new(timeframe: &'static str, action: &'static str) -> Self {
        Self { timeframe, action }
    }
}

const HIGH_TIMELINE: &[TimelineEntry] = &[
    TimelineEntry::new("Immediately", "Contact a healthcare provider or go to emergency"),
    TimelineEntry::new("Within 24 hours", "Get a professional medical evaluation"),
    TimelineEntry::new("Day 2-3", "Follow the prescribed treatment plan"),
    TimelineEntry::new("Day 7", "Follow-up appointment if symptoms persist"),
];

const MODERATE_TIMELINE: &[TimelineEntry] = &[
    TimelineEntry::new("Today", "Start recommended precautions and rest"),
    TimelineEntry::new("Within 2-3 days", "Schedule a doctor appointment"),
    TimelineEntry::new("Day 5-7", "Reassess symptoms and seek help if worse"),
    TimelineEntry::new("After recovery", "Review preventive measures"),
];

const LOW_TIMELINE: &[TimelineEntry] = &[
    TimelineEntry::new("Today", "Begin home care and rest"),
    TimelineEntry::new("Days 1-3", "Monitor symptoms daily"),
    TimelineEntry::new("Day 3-5", "If there is no improvement, consult a doctor"),
    TimelineEntry::new("After recovery", "Maintain healthy habits"),
];

/// Advice tailored to the patient's age and gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemographicAdvice {
    pub category: &'static str,
    pub advice: &'static str,
    pub reason: &'static str,
}

pub const PEDIATRIC_CARE: DemographicAdvice = DemographicAdvice {
    category: "Pediatric care",
    advice: "Children under five need special attention. Consult a pediatrician.",
    reason: "Young children may deteriorate quickly",
};

pub const SENIOR_CARE: DemographicAdvice = DemographicAdvice {
    category: "Senior care",
    advice: "Older adults should seek a medical evaluation sooner because of a higher risk.",
    reason: "Age increases vulnerability to complications",
};

pub const YOUNG_ADULT: DemographicAdvice = DemographicAdvice {
    category: "Young adult",
    advice: "Stay hydrated and get enough rest. Work stress may slow your recovery.",
    reason: "An active lifestyle may mask severity",
};

pub const WOMENS_HEALTH: DemographicAdvice = DemographicAdvice {
    category: "Women's health",
    advice: "If you are pregnant or planning a pregnancy, tell your healthcare provider immediately.",
    reason: "Some treatments may affect reproductive health",
};

pub const DIABETES_RISK: DemographicAdvice = DemographicAdvice {
    category: "Diabetes risk",
    advice: "Regular blood sugar monitoring is essential. Consider an HbA1c test.",
    reason: "Age is a significant risk factor for diabetes complications",
};

/// A question that would sharpen the assessment, with its usual answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowUpQuestion {
    pub question: &'static str,
    pub options: &'static [&'static str],
}

/// Everything said or shown to the patient after a prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub urgency: Urgency,
    pub demographic: Vec<DemographicAdvice>,
    pub timeline: &'static [TimelineEntry],
    pub general_warning_signs: &'static [&'static str],
    pub disease_warning_signs: &'static [&'static str],
    pub follow_up_questions: &'static [FollowUpQuestion],
}

pub fn is_critical(disease: &str) -> bool {
    let disease = disease.trim();
    CRITICAL_DISEASES
        .iter()
        .any(|critical| critical.eq_ignore_ascii_case(disease))
}

fn is_disease(disease: &str, name: &str) -> bool {
    disease.trim().eq_ignore_ascii_case(name)
}

pub fn assess(disease: &str, symptom_count: usize) -> Urgency {
    if is_critical(disease) || symptom_count >= HIGH_SYMPTOM_COUNT {
        Urgency::High
    } else if symptom_count >= MODERATE_SYMPTOM_COUNT {
        Urgency::Moderate
    } else {
        Urgency::Low
    }
}

pub fn demographic_advice(disease: &str, age: u8, gender: Gender) -> Vec<DemographicAdvice> {
    let mut advice = Vec::new();

    if age < 5 {
        advice.push(PEDIATRIC_CARE);
    } else if age >= 60 {
        advice.push(SENIOR_CARE);
    } else if (18..=35).contains(&age) {
        advice.push(YOUNG_ADULT);
    }

    if gender == Gender::Female && (15..=49).contains(&age) {
        advice.push(WOMENS_HEALTH);
    }

    if is_disease(disease, "Diabetes") && age > 40 {
        advice.push(DIABETES_RISK);
    }

    advice
}

/// Signs specific to `disease` that call for emergency care
pub fn disease_warning_signs(disease: &str) -> &'static [&'static str] {
    const SIGNS: &[(&str, &[&str])] = &[
        (
            "Diabetes",
            &[
                "blood sugar below 70 or above 300 milligrams per decilitre",
                "loss of consciousness",
                "severe confusion or unusual behaviour",
            ],
        ),
        (
            "Heart attack",
            &[
                "any chest discomfort, call emergency services immediately",
                "pain spreading to the arm, jaw or back",
                "a cold sweat",
            ],
        ),
        (
            "Hepatitis B",
            &[
                "severe yellowing of the skin or eyes",
                "confusion or drowsiness",
                "bleeding or bruising easily",
                "a swollen abdomen",
            ],
        ),
        (
            "Malaria",
            &[
                "a severe headache with high fever",
                "persistent vomiting",
                "difficulty breathing",
            ],
        ),
    ];

    SIGNS
        .iter()
        .find(|(name, _)| is_disease(disease, name))
        .map(|&(_, signs)| signs)
        .unwrap_or_default()
}

pub fn follow_up_questions(disease: &str) -> &'static [FollowUpQuestion] {
    const QUESTIONS: &[(&str, &[FollowUpQuestion])] = &[
        (
            "Diabetes",
            &[FollowUpQuestion {
                question: "Have you noticed increased thirst or frequent urination?",
                options: &["Yes, both", "Yes, thirst only", "Yes, urination only", "No"],
            }],
        ),
        (
            "Hypertension",
            &[FollowUpQuestion {
                question: "Have you measured your blood pressure recently?",
                options: &["Yes, it was high", "Yes, it was normal", "No"],
            }],
        ),
        (
            "Malaria",
            &[FollowUpQuestion {
                question: "Are you experiencing fever with chills?",
                options: &["Yes, with shaking", "Yes, mild chills", "Fever only", "No fever"],
            }],
        ),
        (
            "Hepatitis B",
            &[FollowUpQuestion {
                question: "Have you noticed yellowing of your skin or eyes?",
                options: &["Yes, both", "Yes, eyes only", "Yes, skin only", "No"],
            }],
        ),
    ];

    QUESTIONS
        .iter()
        .find(|(name, _)| is_disease(disease, name))
        .map(|&(_, questions)| questions)
        .unwrap_or_default()
}

pub fn recommendations(
    disease: &str,
    symptom_count: usize,
    age: u8,
    gender: Gender,
) -> Recommendations {
    let urgency = assess(disease, symptom_count);
    Recommendations {
        urgency,
        demographic: demographic_advice(disease, age, gender),
        timeline: urgency.timeline(),
        general_warning_signs: GENERAL_WARNING_SIGNS,
        disease_warning_signs: disease_warning_signs(disease),
        follow_up_questions: follow_up_questions(disease),
    }
}
