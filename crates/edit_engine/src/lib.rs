//! Edit Engine - paragraph containers and text editing over WordprocessingML
//!
//! This crate builds the paragraph index of a container (body, cell, header,
//! footer, note), keeps it in step with edits, and implements text
//! replacement, bookmarks, lists, tables, sections, headers, footers and
//! notes on top of it. `Document` ties the containers of one package together.

mod error;
mod paragraph;
mod container;
mod find_replace;
mod bookmarks;
mod lists;
mod tables;
mod sections;
mod document;
pub mod paragraph_index;
pub mod splitter;
pub mod run_edit;
pub mod revision;
pub mod header_footer;
pub mod notes;

pub use error::*;
pub use paragraph::*;
pub use container::Container;
pub use find_replace::*;
pub use bookmarks::*;
pub use lists::*;
pub use tables::*;
pub use sections::*;
pub use document::*;
pub use splitter::ParagraphSplit;
pub use revision::{RevisionIds, RevisionInfo};
pub use header_footer::{HeaderFooter, HeaderFooterKind, HeaderFooterType};
pub use notes::{Note, NoteKind};
