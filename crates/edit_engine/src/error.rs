//! Error types for editing operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Package error: {0}")]
    Docx(#[from] store::DocxError),

    #[error("Settings error: {0}")]
    Store(#[from] store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid search pattern: {0}")]
    Regex(#[from] regex_lite::Error),
}

pub type Result<T> = std::result::Result<T, EditError>;
