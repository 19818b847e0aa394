//! telenurse-storage
//!
//! Persistence of finished assessments and of the interview policy text.
//! Assessments go to a local directory or an S3 bucket behind the
//! [`repository::AssessmentRepository`] trait.

pub mod error;
pub mod local;
pub mod objects;
pub mod policy;
pub mod repository;
pub mod s3;
mod staging;
