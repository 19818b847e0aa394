use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Lowest and highest value of the severity and frequency scales.
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// The symptoms covered by the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SymptomKind {
    Fatigue,
    Appetite,
    Nausea,
    Cough,
    /// Pain or discomfort; one entry per distinct body location.
    Discomfort,
}

impl SymptomKind {
    pub const ALL: [SymptomKind; 5] = [
        SymptomKind::Fatigue,
        SymptomKind::Appetite,
        SymptomKind::Nausea,
        SymptomKind::Cough,
        SymptomKind::Discomfort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomKind::Fatigue => "fatigue",
            SymptomKind::Appetite => "appetite",
            SymptomKind::Nausea => "nausea",
            SymptomKind::Cough => "cough",
            SymptomKind::Discomfort => "discomfort",
        }
    }

    /// Fatigue and appetite are rated on severity only.
    pub fn has_frequency(&self) -> bool {
        !matches!(self, SymptomKind::Fatigue | SymptomKind::Appetite)
    }

    pub fn has_location(&self) -> bool {
        matches!(self, SymptomKind::Discomfort)
    }
}

impl fmt::Display for SymptomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymptomKind {
    type Err = CoreError;

    /// Accepts the canonical names plus the aliases used by older
    /// extraction schemas (`lack_of_appetite`, `pain`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "fatigue" => Ok(SymptomKind::Fatigue),
            "appetite" | "lack_of_appetite" | "loss_of_appetite" => Ok(SymptomKind::Appetite),
            "nausea" => Ok(SymptomKind::Nausea),
            "cough" => Ok(SymptomKind::Cough),
            "discomfort" | "pain" => Ok(SymptomKind::Discomfort),
            _ => Err(CoreError::UnknownSymptom(s.to_string())),
        }
    }
}

/// Rating of one symptom as extracted from the interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SymptomRating {
    pub symptom_name: SymptomKind,
    pub severity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub frequency: Option<u8>,
    /// Verbatim patient quotes supporting the rating.
    pub key_indicators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub additional_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub location: Option<String>,
}

impl SymptomRating {
    /// Map key of this rating within an assessment.
    pub fn key(&self) -> String {
        symptom_key(self.symptom_name, self.location.as_deref())
    }
}

/// Build the identifier a rating is stored under.
///
/// Discomfort at a location is keyed `discomfort:<slug>` so that distinct
/// locations never collapse into one entry.
pub fn symptom_key(kind: SymptomKind, location: Option<&str>) -> String {
    match location.map(location_slug).filter(|slug| !slug.is_empty()) {
        Some(slug) if kind.has_location() => format!("{kind}:{slug}"),
        _ => kind.to_string(),
    }
}

fn location_slug(location: &str) -> String {
    location
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Check a raw rating against the 1 to 5 scale.
pub fn checked_rating(symptom: &str, field: &'static str, value: i64) -> Result<u8, CoreError> {
    if (RATING_MIN..=RATING_MAX).contains(&value) {
        Ok(value as u8)
    } else {
        Err(CoreError::RatingOutOfRange {
            symptom: symptom.to_string(),
            field,
            value,
        })
    }
}
