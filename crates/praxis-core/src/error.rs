use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date bound '{0}': expected 'today' or YYYY-MM-DD")]
    InvalidDateBound(String),

    #[error("invalid run status: {0}")]
    InvalidStatus(String),

    #[error("subject hashing key is empty")]
    EmptyHashKey,
}
