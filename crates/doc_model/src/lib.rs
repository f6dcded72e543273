//! Document Model - arena-backed WordprocessingML tree
//!
//! This crate provides the XML tree every package part is loaded into, the
//! qualified OOXML names the engine works with, text extraction, the run
//! formatting value object, numbering lookups and builders for new fragments.

mod node_id;
mod error;
mod xml;
mod formatting;
pub mod names;
pub mod text;
pub mod numbering;
pub mod elements;

pub use node_id::*;
pub use error::*;
pub use xml::*;
pub use formatting::*;
pub use numbering::{ListItemType, NumberingReference};
