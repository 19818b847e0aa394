use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Conversational role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Patient,
    Interviewer,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Interviewer => "Interviewer",
        }
    }
}

/// A single message of the interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn patient(content: impl Into<String>) -> Self {
        Self {
            role: Role::Patient,
            content: content.into(),
        }
    }

    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            content: content.into(),
        }
    }
}

/// Ordered, append-only log of the interview.
///
/// Messages are never reordered, deduplicated or removed. The only way to
/// grow a transcript is [`Transcript::push`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over what the patient said, in order.
    pub fn patient_messages(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|m| m.role == Role::Patient)
            .map(|m| m.content.as_str())
    }

    /// Plain-text rendering, one `Role: content` line per message.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in &self.0 {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(message.role.label());
            out.push_str(": ");
            out.push_str(&message.content);
        }
        out
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}
