//! [Content_Types].xml parsing and generation
//!
//! Maps every part of the package to its MIME type, either by extension
//! (`Default`) or per part (`Override`).

use crate::docx::content_type_values;
use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{escape, XmlParser};
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Represents the content types in a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// Default content types by extension (e.g., "xml" -> "application/xml")
    pub defaults: BTreeMap<String, String>,
    /// Override content types by part name (e.g., "/word/document.xml" -> "...")
    pub overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Create a new ContentTypes with the standard defaults
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.defaults
            .insert("rels".to_string(), content_type_values::RELATIONSHIPS.to_string());
        ct.defaults.insert("xml".to_string(), "application/xml".to_string());
        ct
    }

    /// Parse [Content_Types].xml from its content
    pub fn parse(content: &str) -> DocxResult<Self> {
        let mut result = Self::default();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            XmlParser::get_attribute(e, b"Extension"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    } else if XmlParser::matches_element(name.as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            XmlParser::get_attribute(e, b"PartName"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.insert(normalize(&part), ct);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get the content type for a given part path
    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(&normalize(path)) {
            return Some(ct);
        }

        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        self.defaults.get(&ext.to_ascii_lowercase()).map(String::as_str)
    }

    /// Add an override for a specific part
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides.insert(normalize(part_name), content_type.to_string());
    }

    /// Remove the override for a part
    pub fn remove_override(&mut self, part_name: &str) -> Option<String> {
        self.overrides.remove(&normalize(part_name))
    }

    /// Add a default for an extension unless one exists
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .entry(extension.to_ascii_lowercase())
            .or_insert_with(|| content_type.to_string());
    }

    /// Generate XML content for [Content_Types].xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext),
                escape(ct)
            ));
        }

        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part),
                escape(ct)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

fn normalize(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{}", part_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_creation() {
        let ct = ContentTypes::new();
        assert!(ct.defaults.contains_key("rels"));
        assert!(ct.defaults.contains_key("xml"));
    }

    #[test]
    fn test_content_types_parsing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="PNG" ContentType="image/png"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

        let ct = ContentTypes::parse(xml).unwrap();
        assert_eq!(ct.defaults.get("xml").map(String::as_str), Some("application/xml"));
        assert!(ct.overrides.contains_key("/word/document.xml"));
        assert_eq!(ct.get_content_type("word/media/image1.png"), Some("image/png"));
    }

    #[test]
    fn test_get_content_type() {
        let mut ct = ContentTypes::new();
        ct.add_override("word/document.xml", content_type_values::DOCUMENT);

        assert_eq!(ct.get_content_type("/word/document.xml"), Some(content_type_values::DOCUMENT));
        assert_eq!(ct.get_content_type("word/document.xml"), Some(content_type_values::DOCUMENT));
        assert_eq!(ct.get_content_type("word/other.xml"), Some("application/xml"));
        assert_eq!(ct.get_content_type("word/no_extension"), None);

        assert!(ct.remove_override("word/document.xml").is_some());
        assert_eq!(ct.get_content_type("word/document.xml"), Some("application/xml"));
    }

    #[test]
    fn test_to_xml_roundtrip() {
        let mut original = ContentTypes::new();
        original.add_override("/word/header1.xml", content_type_values::HEADER);
        original.ensure_default("png", "image/png");

        let parsed = ContentTypes::parse(&original.to_xml()).unwrap();
        assert_eq!(original, parsed);
    }
}
