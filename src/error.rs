use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErdError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    #[error("Invalid layout config: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ErdError>;
