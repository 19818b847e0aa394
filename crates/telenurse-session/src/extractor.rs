//! Turning a finished transcript into an assessment.
//!
//! Extraction never loses an interview: when the model's answer cannot be
//! fully validated the assessment is still produced from whatever did
//! validate, escalated for manual review, with the transcript preserved in
//! its notes.

use std::sync::Arc;

use tracing::{info, warn};

use telenurse_bedrock::extract::{ExtractedSymptoms, extraction_request, parse_extraction};
use telenurse_bedrock::gateway::LanguageModel;
use telenurse_core::models::assessment::Assessment;
use telenurse_triage::{Notification, evaluate, manual_review};

use crate::error::SessionError;
use crate::orchestrator::TurnPermit;
use crate::state::Interview;

/// Result of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Complete(ExtractedSymptoms),
    Degraded {
        partial: ExtractedSymptoms,
        error: String,
    },
}

pub struct SymptomExtractor {
    model: Arc<dyn LanguageModel>,
}

impl SymptomExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Run the structured extraction call for `interview`.
    ///
    /// Only a gateway failure is an error; a response that does not
    /// validate becomes [`Extraction::Degraded`].
    pub async fn extract(
        &self,
        _permit: &TurnPermit<'_>,
        interview: &Interview,
    ) -> Result<Extraction, SessionError> {
        let request = extraction_request(&interview.context(), &interview.transcript);
        let response = self.model.complete(&request).await?;

        match parse_extraction(&response, &interview.transcript) {
            Ok(extracted) => {
                info!(
                    patient_id = %interview.patient_id,
                    symptoms = extracted.symptoms.len(),
                    "extraction complete"
                );
                Ok(Extraction::Complete(extracted))
            }
            Err(failure) => {
                warn!(
                    patient_id = %interview.patient_id,
                    errors = failure.errors.len(),
                    kept = failure.partial.symptoms.len(),
                    error = %failure,
                    "extraction did not validate, degrading assessment"
                );
                Ok(Extraction::Degraded {
                    error: failure.to_string(),
                    partial: failure.partial,
                })
            }
        }
    }
}

/// Build the assessment for `interview` taken at `timestamp`.
///
/// Returns the assessment and, for a degraded extraction, the error.
pub fn assemble(
    interview: &Interview,
    extraction: Extraction,
    timestamp: jiff::Timestamp,
) -> (Assessment, Option<String>) {
    let (extracted, notification, error) = match extraction {
        Extraction::Complete(extracted) => {
            let notification = evaluate(&extracted.symptoms);
            (extracted, notification, None)
        }
        Extraction::Degraded { mut partial, error } => {
            let notification = manual_review(&partial.symptoms, &error);
            let transcript = interview.transcript.render();
            partial.conversation_notes = Some(match partial.conversation_notes.take() {
                Some(notes) => format!("{notes}\n\nTranscript:\n{transcript}"),
                None => format!("Transcript:\n{transcript}"),
            });
            (partial, notification, Some(error))
        }
    };

    let Notification {
        level,
        flag_for_oncologist,
        flag_reason,
    } = notification;

    let assessment = Assessment {
        patient_id: interview.patient_id.clone(),
        timestamp,
        language: interview.language,
        input_mode: interview.input_mode,
        symptoms: extracted.symptoms,
        mood_assessment: extracted.mood_assessment,
        conversation_notes: extracted.conversation_notes,
        flag_for_oncologist,
        flag_reason,
        oncologist_notification_level: level,
    };
    (assessment, error)
}
