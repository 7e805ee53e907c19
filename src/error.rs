use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Missing keys: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid {field}: value is not numeric")]
    NotNumeric { field: &'static str },
}

pub type Result<T> = std::result::Result<T, PredictError>;
