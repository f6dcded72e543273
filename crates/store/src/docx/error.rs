//! Error types for package operations

use thiserror::Error;

/// Errors that can occur while reading, mutating or writing a package
#[derive(Debug, Error)]
pub enum DocxError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid package structure
    #[error("Invalid DOCX structure: {0}")]
    InvalidStructure(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A part with this name already exists
    #[error("Part already exists: {0}")]
    DuplicatePart(String),

    /// Relationship error
    #[error("Relationship error: {0}")]
    RelationshipError(String),

    /// A writer panicked while holding a part's lock
    #[error("Part stream poisoned: {0}")]
    Poisoned(String),

    /// Document model error
    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocxError::XmlParse(format!("Attribute error: {}", err))
    }
}

impl From<quick_xml::encoding::EncodingError> for DocxError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        DocxError::XmlParse(format!("Encoding error: {}", err))
    }
}

/// Result type for package operations
pub type DocxResult<T> = std::result::Result<T, DocxError>;
