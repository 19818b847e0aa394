//! telenurse-triage
//!
//! Oncologist notification policy. Pure and deterministic, with no I/O or
//! model calls. Maps a set of symptom ratings to an escalation level, the
//! oncologist flag and a short reason naming the triggering symptoms.
//!
//! The thresholds are the interview policy's own follow-up triggers
//! (severity ≥ 4 or frequency ≥ 4; severity and frequency both 3) reused
//! as the escalation gate.

pub mod policy;

pub use policy::{Notification, evaluate, manual_review};
