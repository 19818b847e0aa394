use std::sync::Arc;

use serde::Serialize;

use telenurse_bedrock::prompt::InterviewContext;
use telenurse_core::models::assessment::{Assessment, InputMode, Language};
use telenurse_core::models::message::Transcript;
use telenurse_core::models::session::{SessionPhase, SessionStatus};

/// One patient's interview in progress.
#[derive(Debug, Clone)]
pub struct Interview {
    pub patient_id: String,
    pub language: Language,
    pub input_mode: InputMode,
    /// Policy text captured when the interview started.
    pub policy: Arc<str>,
    pub transcript: Transcript,
    pub started_at: jiff::Timestamp,
}

impl Interview {
    pub fn context(&self) -> InterviewContext<'_> {
        InterviewContext {
            policy: &self.policy,
            patient_id: &self.patient_id,
            language: self.language,
            input_mode: self.input_mode,
        }
    }
}

/// What `finish` produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedAssessment {
    pub assessment: Assessment,
    /// Name the assessment was persisted under.
    pub artifact: String,
    /// Why extraction failed, when the assessment is degraded.
    pub extraction_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Active(Interview),
    Extracting(Interview),
    Finished {
        interview: Interview,
        outcome: FinishedAssessment,
    },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::NotStarted => SessionPhase::NotStarted,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Extracting(_) => SessionPhase::Extracting,
            SessionState::Finished { .. } => SessionPhase::Finished,
        }
    }

    pub fn interview(&self) -> Option<&Interview> {
        match self {
            SessionState::NotStarted => None,
            SessionState::Active(interview)
            | SessionState::Extracting(interview)
            | SessionState::Finished { interview, .. } => Some(interview),
        }
    }

    /// Serializable snapshot of this state.
    pub fn status(&self, busy: bool) -> SessionStatus {
        let mut status = SessionStatus {
            active: matches!(self, SessionState::Active(_) | SessionState::Extracting(_)),
            phase: self.phase(),
            busy,
            ..SessionStatus::default()
        };
        if let Some(interview) = self.interview() {
            status.patient_id = interview.patient_id.clone();
            status.language = Some(interview.language);
            status.input_mode = Some(interview.input_mode);
            status.transcript = interview.transcript.messages().to_vec();
        }
        if let SessionState::Finished { outcome, .. } = self {
            status.assessment = Some(outcome.assessment.clone());
            status.artifact = Some(outcome.artifact.clone());
            status.extraction_error = outcome.extraction_error.clone();
        }
        status
    }
}
