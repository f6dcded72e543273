//! Error types for storage operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Package error: {0}")]
    Docx(#[from] crate::docx::DocxError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
