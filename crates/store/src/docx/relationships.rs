//! Relationships (.rels) parsing and generation
//!
//! Every part may carry a relationships part (`word/_rels/document.xml.rels`
//! for `word/document.xml`, `_rels/.rels` for the package itself) that links
//! it to other parts by id.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{escape, XmlParser};
use quick_xml::events::Event;

/// A single relationship in a .rels file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Unique ID within the rels file (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part's folder)
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target within the package
    #[default]
    Internal,
    /// External target (URL)
    External,
}

/// Collection of relationships from a .rels file, in file order
#[derive(Debug, Clone)]
pub struct Relationships {
    relationships: Vec<Relationship>,
    /// Counter for generating new IDs
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

impl Relationships {
    /// Create a new empty relationships collection
    pub fn new() -> Self {
        Self {
            relationships: Vec::new(),
            next_id: 1,
        }
    }

    /// Parse a .rels file from its XML content
    pub fn parse(content: &str) -> DocxResult<Self> {
        let mut result = Self::new();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();
        let mut max_id = 0u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Relationship") {
                        let id = XmlParser::get_attribute(e, b"Id")
                            .ok_or_else(|| DocxError::InvalidStructure("Relationship missing Id".into()))?;
                        let rel_type = XmlParser::get_attribute(e, b"Type")
                            .ok_or_else(|| DocxError::InvalidStructure("Relationship missing Type".into()))?;
                        let target = XmlParser::get_attribute(e, b"Target")
                            .ok_or_else(|| DocxError::InvalidStructure("Relationship missing Target".into()))?;
                        let target_mode = XmlParser::get_attribute(e, b"TargetMode")
                            .map(|m| if m == "External" { TargetMode::External } else { TargetMode::Internal })
                            .unwrap_or(TargetMode::Internal);

                        // Track max ID for generating new ones
                        if let Some(num) = id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
                            max_id = max_id.max(num);
                        }

                        result.relationships.push(Relationship {
                            id,
                            rel_type,
                            target,
                            target_mode,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        result.next_id = max_id + 1;
        Ok(result)
    }

    /// Add a relationship and return its ID
    pub fn add(&mut self, rel_type: &str, target: &str, target_mode: TargetMode) -> String {
        let mut id = format!("rId{}", self.next_id);
        while self.contains(&id) {
            self.next_id += 1;
            id = format!("rId{}", self.next_id);
        }
        self.next_id += 1;

        self.relationships.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode,
        });

        id
    }

    /// Remove a relationship by ID, returning it
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let index = self.relationships.iter().position(|r| r.id == id)?;
        Some(self.relationships.remove(index))
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Get a relationship by type
    pub fn get_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.rel_type == rel_type)
    }

    /// Get all relationships of a given type
    pub fn get_all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Get the target path for a relationship ID
    pub fn get_target(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.target.as_str())
    }

    /// Check if a relationship exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get all relationships
    pub fn all(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Check if there are no relationships
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Generate XML content for the .rels file
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);

        for rel in &self.relationships {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(&rel.id),
                escape(&rel.rel_type),
                escape(&rel.target)
            ));
            if rel.target_mode == TargetMode::External {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

/// Name of the relationships part describing `source` (`""` = the package)
pub fn rels_part_name(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((folder, file)) => format!("{}/_rels/{}.rels", folder, file),
        None if source.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", source),
    }
}

/// Source part described by a relationships part name, if it is one
pub fn source_of_rels_part(rels_part: &str) -> Option<String> {
    let stem = rels_part.strip_suffix(".rels")?;
    let (folder, file) = match stem.rsplit_once("_rels/") {
        Some((folder, file)) => (folder, file),
        None => return None,
    };
    Some(format!("{}{}", folder, file))
}

/// Resolve a relationship target relative to the folder of `source`
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((folder, _)) => folder.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Express `part` as a target relative to the folder of `source`
pub fn relative_target(source: &str, part: &str) -> String {
    match source.rsplit_once('/') {
        Some((folder, _)) => match part.strip_prefix(&format!("{}/", folder)) {
            Some(relative) => relative.to_string(),
            None => format!("/{}", part),
        },
        None => part.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::relationship_types;

    #[test]
    fn test_relationships_parsing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;

        let rels = Relationships::parse(xml).unwrap();
        assert_eq!(rels.len(), 2);

        let r1 = rels.get("rId1").unwrap();
        assert_eq!(r1.target, "word/document.xml");
        assert_eq!(r1.target_mode, TargetMode::Internal);

        let r2 = rels.get("rId2").unwrap();
        assert_eq!(r2.target, "https://example.com/?a=1&b=2");
        assert_eq!(r2.target_mode, TargetMode::External);
    }

    #[test]
    fn test_add_and_remove_relationship() {
        let mut rels = Relationships::new();
        let id1 = rels.add(relationship_types::DOCUMENT, "word/document.xml", TargetMode::Internal);
        let id2 = rels.add(relationship_types::STYLES, "styles.xml", TargetMode::Internal);

        assert_eq!(id1, "rId1");
        assert_eq!(id2, "rId2");

        assert!(rels.remove("rId1").is_some());
        assert!(!rels.contains("rId1"));
        assert!(rels.remove("rId1").is_none());

        // ids are never reused within one collection
        let id3 = rels.add(relationship_types::HEADER, "header1.xml", TargetMode::Internal);
        assert_eq!(id3, "rId3");
    }

    #[test]
    fn test_to_xml_roundtrip_keeps_order() {
        let mut original = Relationships::new();
        original.add(relationship_types::STYLES, "styles.xml", TargetMode::Internal);
        original.add(relationship_types::HYPERLINK, "http://x.test/?q=a&b", TargetMode::External);

        let parsed = Relationships::parse(&original.to_xml()).unwrap();
        let ids: Vec<_> = parsed.all().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rId1", "rId2"]);
        assert_eq!(parsed.get_target("rId2"), Some("http://x.test/?q=a&b"));
    }

    #[test]
    fn test_rels_part_names() {
        assert_eq!(rels_part_name(""), "_rels/.rels");
        assert_eq!(rels_part_name("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(source_of_rels_part("_rels/.rels").as_deref(), Some(""));
        assert_eq!(
            source_of_rels_part("word/_rels/document.xml.rels").as_deref(),
            Some("word/document.xml")
        );
        assert_eq!(source_of_rels_part("word/document.xml"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "header1.xml"), "word/header1.xml");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word/document.xml", "/word/media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(relative_target("word/document.xml", "word/header2.xml"), "header2.xml");
    }
}
