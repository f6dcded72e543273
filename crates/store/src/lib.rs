//! Store - package persistence and engine settings
//!
//! This crate owns everything between the editing engine and the bytes on
//! disk: the in-memory OPC package with its content types and relationships,
//! XML part parsing/serialization into the `doc_model` arena, and the JSON
//! settings the engine runs with.

mod error;
mod settings;
pub mod docx;

pub use error::*;
pub use settings::*;

// Re-export package functionality
pub use docx::{DocxError, DocxResult, Package, Part, TargetMode};
