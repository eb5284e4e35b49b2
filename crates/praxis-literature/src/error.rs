use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiteratureError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{endpoint} failed with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("unexpected response from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
