//! telenurse-bedrock
//!
//! Language-model gateway: the request/response seam used by the interview,
//! its AWS Bedrock Converse implementation, prompt assembly and the
//! structured symptom-extraction parser.

pub mod chat;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod prompt;
