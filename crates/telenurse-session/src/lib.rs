//! telenurse-session
//!
//! The single interview session: its lifecycle, the turn-by-turn exchange
//! with the language model, and turning the finished transcript into a
//! persisted assessment.

pub mod error;
pub mod extractor;
pub mod manager;
pub mod orchestrator;
pub mod state;

pub use error::SessionError;
pub use manager::SessionManager;
