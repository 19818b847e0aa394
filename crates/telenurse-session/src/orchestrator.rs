//! One interviewer reply per call, one call at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use telenurse_bedrock::error::BedrockError;
use telenurse_bedrock::gateway::LanguageModel;
use telenurse_bedrock::prompt::InterviewContext;
use telenurse_core::models::message::Message;

use crate::error::SessionError;

/// Exclusive right to talk to the model. Released on drop.
#[derive(Debug)]
pub struct TurnPermit<'a> {
    busy: &'a AtomicBool,
}

impl Drop for TurnPermit<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct ConversationOrchestrator {
    model: Arc<dyn LanguageModel>,
    busy: AtomicBool,
}

impl ConversationOrchestrator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            busy: AtomicBool::new(false),
        }
    }

    /// Take the turn permit without waiting. Fails with `Busy` if it is held.
    pub fn acquire(&self, operation: &'static str) -> Result<TurnPermit<'_>, SessionError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy { operation })?;
        Ok(TurnPermit { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Ask the model for the next interviewer message.
    ///
    /// `history` ends with the patient message being answered, or is empty
    /// for the opening greeting. Failures are returned as-is.
    pub async fn reply(
        &self,
        _permit: &TurnPermit<'_>,
        context: &InterviewContext<'_>,
        history: &[Message],
    ) -> Result<Message, SessionError> {
        let request = context.conversation_request(history);
        debug!(patient_id = context.patient_id, turns = history.len(), "requesting interviewer reply");

        let text = self.model.complete(&request).await.map_err(|e| {
            warn!(patient_id = context.patient_id, error = %e, "interviewer reply failed");
            SessionError::Gateway(e)
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(BedrockError::ResponseParse("model returned an empty reply".to_string()).into());
        }
        Ok(Message::interviewer(text))
    }
}
