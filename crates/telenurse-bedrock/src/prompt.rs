//! Interview prompt assembly.
//!
//! The interview policy is passed to the model verbatim as the first system
//! block. Input mode and language add their own directive blocks after it.
//! A patient-side check-in cue opens every conversation so the model always
//! sees a user-first, strictly alternating exchange; the cue is never part
//! of the stored transcript.

use telenurse_core::models::assessment::{InputMode, Language};
use telenurse_core::models::message::{Message, Role};

use crate::chat::ChatMessage;
use crate::gateway::{CompletionMode, CompletionRequest};

pub const VOICE_DIRECTIVE: &str = "\
IMPORTANT VOICE INTERACTION GUIDELINES:
- Keep responses concise since they will be spoken aloud (2-3 sentences maximum)
- Use simple, clear language suitable for voice communication
- Pause appropriately between key points by using commas and periods";

pub const CANTONESE_DIRECTIVE: &str = "Please respond in Cantonese (廣東話/粵語).";

/// Everything that shapes the prompt of one interview.
#[derive(Debug, Clone, Copy)]
pub struct InterviewContext<'a> {
    pub policy: &'a str,
    pub patient_id: &'a str,
    pub language: Language,
    pub input_mode: InputMode,
}

impl<'a> InterviewContext<'a> {
    /// System blocks for conversational turns.
    pub fn system_blocks(&self) -> Vec<String> {
        let mut blocks = vec![self.policy.to_string()];
        if self.input_mode == InputMode::Speech {
            blocks.push(VOICE_DIRECTIVE.to_string());
        }
        if self.language == Language::Zh {
            blocks.push(CANTONESE_DIRECTIVE.to_string());
        }
        blocks
    }

    /// The synthetic first patient message.
    pub fn opening_cue(&self) -> String {
        let id = self.patient_id;
        match self.language {
            Language::En => format!("[PATIENT PROFILE: ID {id}] Hello, I'm here for my check-in today."),
            Language::Zh => format!("[PATIENT PROFILE: ID {id}] 您好，我今天來做例行檢查。"),
        }
    }

    /// Model messages for `history`, led by the opening cue.
    pub fn chat_messages(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::user(self.opening_cue()));
        messages.extend(history.iter().map(to_chat));
        messages
    }

    /// Request for the next interviewer reply.
    ///
    /// `history` is the transcript so far, including the patient message
    /// being answered.
    pub fn conversation_request(&self, history: &[Message]) -> CompletionRequest {
        CompletionRequest {
            system: self.system_blocks(),
            messages: self.chat_messages(history),
            mode: CompletionMode::Conversation,
        }
    }
}

pub fn to_chat(message: &Message) -> ChatMessage {
    match message.role {
        Role::Patient => ChatMessage::user(message.content.clone()),
        Role::Interviewer => ChatMessage::assistant(message.content.clone()),
    }
}
