use thiserror::Error;

#[derive(Error, Debug)]
pub enum SparkError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Malformed generation payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
