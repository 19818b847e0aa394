use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

use super::symptom::SymptomRating;

const PATIENT_ID_MAX_LEN: usize = 64;

/// Interview language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Language {
    #[default]
    En,
    /// Cantonese.
    Zh,
}

/// How the patient talks to the interviewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InputMode {
    #[default]
    Keyboard,
    Speech,
}

/// Clinical escalation tier. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationLevel {
    #[default]
    None,
    Amber,
    Red,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::None => "none",
            NotificationLevel::Amber => "amber",
            NotificationLevel::Red => "red",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed symptom assessment.
///
/// The serialized form is the persisted artifact read by result viewers;
/// field names are a stable contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Assessment {
    pub patient_id: String,
    pub timestamp: jiff::Timestamp,
    pub language: Language,
    pub input_mode: InputMode,
    pub symptoms: BTreeMap<String, SymptomRating>,
    pub mood_assessment: Option<String>,
    pub conversation_notes: Option<String>,
    pub flag_for_oncologist: bool,
    pub flag_reason: Option<String>,
    pub oncologist_notification_level: NotificationLevel,
}

/// Validate a patient identifier.
///
/// Identifiers become part of artifact names, so only ASCII letters,
/// digits, `-` and `_` are accepted.
pub fn validate_patient_id(id: &str) -> Result<&str, CoreError> {
    let invalid = |reason| CoreError::InvalidPatientId {
        id: id.to_string(),
        reason,
    };

    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::MissingField("patient_id".to_string()));
    }
    if trimmed.len() > PATIENT_ID_MAX_LEN {
        return Err(invalid("longer than 64 characters"));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("only letters, digits, '-' and '_' are allowed"));
    }
    Ok(trimmed)
}
