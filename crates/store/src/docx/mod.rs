//! OPC package access for WordprocessingML documents
//!
//! A .docx file is a ZIP archive of XML parts:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships
//! - `word/document.xml` - Main document content
//! - `word/_rels/document.xml.rels` - Document relationships
//! - `word/styles.xml`, `word/numbering.xml` - Style and list definitions
//! - `word/header*.xml`, `word/footer*.xml` - Headers and footers
//! - `word/footnotes.xml`, `word/endnotes.xml` - Notes
//! - `word/media/` - Embedded images and media
//!
//! [`Package`] keeps every part in memory, [`xml_io`] moves XML parts in and
//! out of the `doc_model` arena.

mod error;
mod reader;
mod content_types;
mod relationships;
mod package;
pub mod template;
pub mod xml_io;

pub use error::{DocxError, DocxResult};
pub use reader::{escape, DocxReader, XmlParser};
pub use content_types::ContentTypes;
pub use relationships::{
    relative_target, rels_part_name, resolve_target, source_of_rels_part, Relationship,
    Relationships, TargetMode,
};
pub use package::{Package, Part};

/// Relationship types used by the engine
pub mod relationship_types {
    pub const DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const NUMBERING: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const SETTINGS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    pub const FOOTNOTES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const ENDNOTES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
}

/// Content types for package parts
pub mod content_type_values {
    pub const DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const NUMBERING: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
    pub const SETTINGS: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const FOOTNOTES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
    pub const ENDNOTES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_template_parses() {
        let mut tree = doc_model::XmlTree::new();
        for (name, xml) in template::PARTS {
            let root = xml_io::parse_part(&mut tree, xml.as_bytes()).unwrap();
            assert!(tree.is_element(root), "{} has no root", name);
        }
        for xml in [
            template::NUMBERING_XML,
            template::HEADER_XML,
            template::FOOTER_XML,
            template::FOOTNOTES_XML,
            template::ENDNOTES_XML,
        ] {
            assert!(xml_io::parse_part(&mut tree, xml.as_bytes()).is_ok());
        }
    }
}
