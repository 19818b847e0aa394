pub mod assessment;
pub mod message;
pub mod session;
pub mod symptom;
