use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid patient id '{id}': {reason}")]
    InvalidPatientId { id: String, reason: &'static str },

    #[error("unknown symptom: {0}")]
    UnknownSymptom(String),

    #[error("{symptom}: {field} rating {value} is outside range [1, 5]")]
    RatingOutOfRange {
        symptom: String,
        field: &'static str,
        value: i64,
    },
}
