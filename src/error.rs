use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server rejected {method}: {message}")]
    Api { method: String, message: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    BadDate(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
