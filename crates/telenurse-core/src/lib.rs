//! telenurse-core
//!
//! Pure domain types and artifact naming conventions.
//! No AWS SDK or I/O dependency; this is the shared vocabulary of the
//! telenurse system.

pub mod artifact;
pub mod error;
pub mod models;
