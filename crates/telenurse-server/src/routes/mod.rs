pub mod assessments;
pub mod health;
pub mod policy;
pub mod session;
