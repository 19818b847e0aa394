//! The process-wide interview session.
//!
//! State lives behind a short-lived lock that is never held across an
//! await. Model calls run outside it under the orchestrator's turn permit,
//! so [`SessionManager::status`] always answers immediately and only ever
//! sees whole appends.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::info;

use telenurse_bedrock::gateway::LanguageModel;
use telenurse_core::models::assessment::{Assessment, InputMode, Language, validate_patient_id};
use telenurse_core::models::message::{Message, Transcript};
use telenurse_core::models::session::{SessionPhase, SessionStatus};
use telenurse_storage::policy::PolicyStore;
use telenurse_storage::repository::AssessmentRepository;

use crate::error::SessionError;
use crate::extractor::{SymptomExtractor, assemble};
use crate::orchestrator::ConversationOrchestrator;
use crate::state::{FinishedAssessment, Interview, SessionState};

pub struct SessionManager {
    state: RwLock<SessionState>,
    orchestrator: ConversationOrchestrator,
    extractor: SymptomExtractor,
    repository: Arc<dyn AssessmentRepository>,
    policy: RwLock<Arc<str>>,
    policy_store: Option<PolicyStore>,
    /// Held across persisting and swapping the policy.
    policy_update: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        repository: Arc<dyn AssessmentRepository>,
        policy: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            state: RwLock::new(SessionState::NotStarted),
            orchestrator: ConversationOrchestrator::new(Arc::clone(&model)),
            extractor: SymptomExtractor::new(model),
            repository,
            policy: RwLock::new(policy.into()),
            policy_store: None,
            policy_update: Mutex::new(()),
        }
    }

    /// Persist policy updates to `store`.
    pub fn with_policy_store(mut self, store: PolicyStore) -> Self {
        self.policy_store = Some(store);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.read().phase() {
            SessionPhase::Active => Ok(()),
            phase => Err(SessionError::InvalidState { operation, phase }),
        }
    }

    fn ensure_idle(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.read().phase() {
            phase @ (SessionPhase::Active | SessionPhase::Extracting) => {
                Err(SessionError::InvalidState { operation, phase })
            }
            _ => Ok(()),
        }
    }

    fn active_interview(&self, operation: &'static str) -> Result<Interview, SessionError> {
        match &*self.read() {
            SessionState::Active(interview) => Ok(interview.clone()),
            other => Err(SessionError::InvalidState {
                operation,
                phase: other.phase(),
            }),
        }
    }

    /// Begin an interview and return the interviewer's greeting.
    ///
    /// A finished session is discarded from memory; its artifact stays
    /// persisted. If the greeting cannot be obtained nothing is started.
    pub async fn start(
        &self,
        patient_id: &str,
        language: Language,
        input_mode: InputMode,
    ) -> Result<Message, SessionError> {
        let patient_id = validate_patient_id(patient_id)?.to_string();

        self.ensure_idle("start an assessment")?;
        let permit = self.orchestrator.acquire("start an assessment")?;
        self.ensure_idle("start an assessment")?;

        let mut interview = Interview {
            patient_id,
            language,
            input_mode,
            policy: self.policy(),
            transcript: Transcript::new(),
            started_at: jiff::Timestamp::now(),
        };

        let greeting = self
            .orchestrator
            .reply(&permit, &interview.context(), &[])
            .await?;
        interview.transcript.push(greeting.clone());

        info!(
            patient_id = %interview.patient_id,
            language = ?interview.language,
            input_mode = ?interview.input_mode,
            "assessment started"
        );
        *self.write() = SessionState::Active(interview);
        Ok(greeting)
    }

    /// Send a patient message and return it together with the reply.
    ///
    /// Both messages are appended together, and only if the reply arrives.
    pub async fn send_message(&self, text: &str) -> Result<[Message; 2], SessionError> {
        let text = text.trim();
        self.ensure_active("send a message")?;
        if text.is_empty() {
            return Err(SessionError::InvalidInput("message must not be empty".to_string()));
        }

        let permit = self.orchestrator.acquire("send a message")?;
        let interview = self.active_interview("send a message")?;

        let patient = Message::patient(text);
        let mut history = interview.transcript.messages().to_vec();
        history.push(patient.clone());

        let reply = self
            .orchestrator
            .reply(&permit, &interview.context(), &history)
            .await?;

        let mut state = self.write();
        if let SessionState::Active(current) = &mut *state {
            current.transcript.push(patient.clone());
            current.transcript.push(reply.clone());
            info!(
                patient_id = %current.patient_id,
                messages = current.transcript.len(),
                "turn complete"
            );
        }
        Ok([patient, reply])
    }

    /// Rate the interview, persist the assessment and finish the session.
    ///
    /// Model or storage failures return the session to active so the
    /// caller can try again.
    pub async fn finish(&self) -> Result<FinishedAssessment, SessionError> {
        self.ensure_active("finish the assessment")?;
        let permit = self.orchestrator.acquire("finish the assessment")?;

        let interview = {
            let mut state = self.write();
            match std::mem::take(&mut *state) {
                SessionState::Active(interview) => {
                    *state = SessionState::Extracting(interview.clone());
                    interview
                }
                other => {
                    let phase = other.phase();
                    *state = other;
                    return Err(SessionError::InvalidState {
                        operation: "finish the assessment",
                        phase,
                    });
                }
            }
        };
        let restore = RestoreActive { state: &self.state, armed: true };

        info!(patient_id = %interview.patient_id, messages = interview.transcript.len(), "extracting assessment");
        let extraction = self.extractor.extract(&permit, &interview).await?;
        let (assessment, extraction_error) = assemble(&interview, extraction, jiff::Timestamp::now());
        let artifact = self.repository.save(&assessment).await?;

        let outcome = FinishedAssessment {
            assessment,
            artifact,
            extraction_error,
        };
        info!(
            patient_id = %interview.patient_id,
            started_at = %interview.started_at,
            artifact = %outcome.artifact,
            level = %outcome.assessment.oncologist_notification_level,
            degraded = outcome.extraction_error.is_some(),
            "assessment finished"
        );

        restore.disarm();
        *self.write() = SessionState::Finished {
            interview,
            outcome: outcome.clone(),
        };
        drop(permit);
        Ok(outcome)
    }

    /// Abandon the active interview without saving anything.
    pub fn cancel(&self) -> Result<(), SessionError> {
        self.ensure_active("cancel the assessment")?;
        let _permit = self.orchestrator.acquire("cancel the assessment")?;

        let mut state = self.write();
        match std::mem::take(&mut *state) {
            SessionState::Active(interview) => {
                info!(
                    patient_id = %interview.patient_id,
                    messages = interview.transcript.len(),
                    "assessment cancelled"
                );
                Ok(())
            }
            other => {
                let phase = other.phase();
                *state = other;
                Err(SessionError::InvalidState {
                    operation: "cancel the assessment",
                    phase,
                })
            }
        }
    }

    /// Clear a finished session. Does nothing when no session exists.
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut state = self.write();
        match &*state {
            SessionState::NotStarted => Ok(()),
            SessionState::Finished { interview, .. } => {
                info!(patient_id = %interview.patient_id, "session reset");
                *state = SessionState::NotStarted;
                Ok(())
            }
            other => Err(SessionError::InvalidState {
                operation: "reset the session",
                phase: other.phase(),
            }),
        }
    }

    pub fn status(&self) -> SessionStatus {
        let busy = self.orchestrator.is_busy();
        self.read().status(busy)
    }

    /// The interview policy new sessions will start with.
    pub fn policy(&self) -> Arc<str> {
        Arc::clone(&self.policy.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the interview policy. Running sessions keep the text they
    /// started with.
    ///
    /// Updates are serialized, so the stored file always matches the text
    /// new sessions start with.
    pub async fn update_policy(&self, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::InvalidInput("system prompt must not be empty".to_string()));
        }
        let _update = self.policy_update.lock().await;
        if let Some(store) = &self.policy_store {
            store.save(text).await?;
        }
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(text);
        info!(len = text.len(), "interview policy updated");
        Ok(())
    }

    pub async fn list_saved_assessments(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get_assessment(&self, name: &str) -> Result<Assessment, SessionError> {
        Ok(self.repository.get(name).await?)
    }
}

/// Puts an extracting session back to active unless disarmed, covering both
/// failures and a `finish` future dropped mid-call.
struct RestoreActive<'a> {
    state: &'a RwLock<SessionState>,
    armed: bool,
}

impl RestoreActive<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RestoreActive<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = match std::mem::take(&mut *state) {
            SessionState::Extracting(interview) => SessionState::Active(interview),
            other => other,
        };
    }
}
