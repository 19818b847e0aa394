use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::assessment::{Assessment, InputMode, Language};
use super::message::Message;

/// Lifecycle phase of the interview session.
///
/// `Cancelled` is never observable: a cancelled session returns to
/// `NotStarted` in the same step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Active,
    /// Transient: the finished transcript is being rated.
    Extracting,
    Finished,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Active => "active",
            SessionPhase::Extracting => "extracting",
            SessionPhase::Finished => "finished",
        }
    }
}

/// Point-in-time snapshot of the session, polled by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionStatus {
    pub active: bool,
    pub phase: SessionPhase,
    /// A language-model call is in flight.
    pub busy: bool,
    /// Empty when no session exists.
    pub patient_id: String,
    pub language: Option<Language>,
    pub input_mode: Option<InputMode>,
    pub transcript: Vec<Message>,
    pub assessment: Option<Assessment>,
    /// Name of the persisted artifact once finished.
    pub artifact: Option<String>,
    /// Set when the assessment was produced from a failed extraction.
    pub extraction_error: Option<String>,
}
