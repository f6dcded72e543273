//! In-memory OPC package
//!
//! A package is a set of named parts plus the bookkeeping parts that describe
//! them: `[Content_Types].xml` and one relationships part per source part.
//! Bookkeeping parts are parsed on open and regenerated on save; every other
//! part is kept as raw bytes behind its own lock, so a writer always replaces
//! a part's whole stream at once.

use crate::docx::content_types::ContentTypes;
use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::DocxReader;
use crate::docx::relationships::{
    rels_part_name, resolve_target, source_of_rels_part, Relationship, Relationships, TargetMode,
};
use crate::docx::{relationship_types, template};
use crate::settings::{Compression, PackageSettings};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// A named part and its byte stream
#[derive(Debug)]
pub struct Part {
    name: String,
    data: Mutex<Vec<u8>>,
}

impl Part {
    fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            data: Mutex::new(data),
        }
    }

    /// Part name without leading slash (e.g. `word/document.xml`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the part's current bytes
    pub fn read(&self) -> DocxResult<Vec<u8>> {
        let data = self
            .data
            .lock()
            .map_err(|_| DocxError::Poisoned(self.name.clone()))?;
        Ok(data.clone())
    }

    /// Replace the part's bytes
    pub fn write(&self, bytes: Vec<u8>) -> DocxResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| DocxError::Poisoned(self.name.clone()))?;
        *data = bytes;
        Ok(())
    }

    /// Check whether the part holds XML
    pub fn is_xml(&self) -> bool {
        self.name.ends_with(".xml") || self.name.ends_with(".rels")
    }
}

/// A package held in memory
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<Part>,
    content_types: ContentTypes,
    /// Relationships keyed by source part name (`""` for the package)
    relationships: BTreeMap<String, Relationships>,
}

impl Package {
    /// Read a package from a ZIP stream
    pub fn open<R: Read + Seek>(reader: R) -> DocxResult<Self> {
        let mut archive = DocxReader::new(reader)?;
        let mut package = Package::default();
        let mut content_types = None;

        for (name, bytes) in archive.read_all()? {
            if name == CONTENT_TYPES_PART {
                content_types = Some(ContentTypes::parse(&String::from_utf8(bytes)?)?);
            } else if let Some(source) = source_of_rels_part(&name) {
                let rels = Relationships::parse(&String::from_utf8(bytes)?)?;
                package.relationships.insert(source, rels);
            } else {
                package.parts.push(Part::new(&name, bytes));
            }
        }

        package.content_types =
            content_types.ok_or_else(|| DocxError::MissingPart(CONTENT_TYPES_PART.to_string()))?;
        tracing::debug!(
            parts = package.parts.len(),
            relationship_sets = package.relationships.len(),
            "opened package"
        );
        Ok(package)
    }

    /// Read a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        Self::open(Cursor::new(bytes))
    }

    /// Build a minimal package holding one empty document
    pub fn new_blank() -> Self {
        let mut package = Package {
            parts: Vec::new(),
            content_types: template::content_types(),
            relationships: BTreeMap::new(),
        };
        for (name, xml) in template::PARTS {
            package.parts.push(Part::new(name, xml.as_bytes().to_vec()));
        }
        package.relationships.insert(String::new(), template::package_relationships());
        package
            .relationships
            .insert(template::DOCUMENT_PART.to_string(), template::document_relationships());
        package
    }

    // =========================================================================
    // Parts
    // =========================================================================

    /// Get a part by name
    pub fn get_part(&self, name: &str) -> Option<&Part> {
        let name = name.trim_start_matches('/');
        self.parts.iter().find(|p| p.name == name)
    }

    /// Get a part by name, failing if it is absent
    pub fn require_part(&self, name: &str) -> DocxResult<&Part> {
        self.get_part(name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))
    }

    /// Check whether a part exists
    pub fn contains_part(&self, name: &str) -> bool {
        self.get_part(name).is_some()
    }

    /// Names of all content parts in package order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Create a new part with its content-type override
    pub fn create_part(&mut self, name: &str, content_type: &str, bytes: Vec<u8>) -> DocxResult<&Part> {
        let name = name.trim_start_matches('/');
        if self.contains_part(name) {
            return Err(DocxError::DuplicatePart(name.to_string()));
        }
        self.content_types.add_override(name, content_type);
        self.parts.push(Part::new(name, bytes));
        tracing::debug!(part = name, content_type, "created part");
        self.require_part(name)
    }

    /// Delete a part, its content-type override and its own relationships.
    /// Relationships pointing at the part are left to the caller.
    pub fn delete_part(&mut self, name: &str) -> bool {
        let name = name.trim_start_matches('/');
        let Some(index) = self.parts.iter().position(|p| p.name == name) else {
            return false;
        };
        self.parts.remove(index);
        self.content_types.remove_override(name);
        self.relationships.remove(name);
        tracing::debug!(part = name, "deleted part");
        true
    }

    /// Pick a free part name `{prefix}{n}{suffix}` starting at 1
    pub fn next_part_name(&self, prefix: &str, suffix: &str) -> String {
        (1..)
            .map(|n| format!("{}{}{}", prefix, n, suffix))
            .find(|candidate| !self.contains_part(candidate))
            .unwrap_or_else(|| format!("{}{}", prefix, suffix))
    }

    /// Content types of the package
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Content type of a part
    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.content_types.get_content_type(name)
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// Relationships whose source is `source` (`""` for the package)
    pub fn relationships(&self, source: &str) -> Option<&Relationships> {
        self.relationships.get(source)
    }

    /// Add a relationship from `source` and return its id
    pub fn create_relationship(
        &mut self,
        source: &str,
        rel_type: &str,
        target: &str,
        target_mode: TargetMode,
    ) -> String {
        self.relationships
            .entry(source.to_string())
            .or_default()
            .add(rel_type, target, target_mode)
    }

    /// Delete a relationship; returns false if it did not exist
    pub fn delete_relationship(&mut self, source: &str, id: &str) -> bool {
        self.relationships
            .get_mut(source)
            .and_then(|rels| rels.remove(id))
            .is_some()
    }

    /// Look up one relationship
    pub fn relationship(&self, source: &str, id: &str) -> Option<&Relationship> {
        self.relationships.get(source)?.get(id)
    }

    /// Part targeted by an internal relationship
    pub fn relationship_part(&self, source: &str, id: &str) -> DocxResult<String> {
        let rel = self.relationship(source, id).ok_or_else(|| {
            DocxError::RelationshipError(format!("{} has no relationship {}", source, id))
        })?;
        if rel.target_mode == TargetMode::External {
            return Err(DocxError::RelationshipError(format!(
                "relationship {} of {} is external",
                id, source
            )));
        }
        Ok(resolve_target(source, &rel.target))
    }

    /// Parts related to `source` by `rel_type`, with their relationship ids
    pub fn related_parts(&self, source: &str, rel_type: &str) -> Vec<(String, String)> {
        self.relationships(source)
            .map(|rels| {
                rels.get_all_by_type(rel_type)
                    .into_iter()
                    .filter(|r| r.target_mode == TargetMode::Internal)
                    .map(|r| (r.id.clone(), resolve_target(source, &r.target)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Name of the main document part
    pub fn main_document_part(&self) -> DocxResult<String> {
        self.related_parts("", relationship_types::DOCUMENT)
            .into_iter()
            .map(|(_, part)| part)
            .next()
            .ok_or_else(|| DocxError::InvalidStructure("package has no main document relationship".into()))
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Write the package as a ZIP stream
    pub fn save<W: Write + Seek>(&self, writer: W, settings: &PackageSettings) -> DocxResult<W> {
        let mut zip = ZipWriter::new(writer);
        let xml_options = {
            let method = match settings.compression {
                Compression::Stored => zip::CompressionMethod::Stored,
                Compression::Deflated => zip::CompressionMethod::Deflated,
            };
            SimpleFileOptions::default()
                .compression_method(method)
                .compression_level(settings.compression_level)
        };
        // Don't compress binary
        let binary_options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zip.start_file(CONTENT_TYPES_PART, xml_options)?;
        zip.write_all(self.content_types.to_xml().as_bytes())?;

        for (source, rels) in &self.relationships {
            if rels.is_empty() && !source.is_empty() {
                continue;
            }
            zip.start_file(rels_part_name(source), xml_options)?;
            zip.write_all(rels.to_xml().as_bytes())?;
        }

        for part in &self.parts {
            let options = if part.is_xml() { xml_options } else { binary_options };
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.read()?)?;
        }

        tracing::debug!(parts = self.parts.len(), "saved package");
        Ok(zip.finish()?)
    }

    /// Write the package to bytes
    pub fn to_bytes(&self, settings: &PackageSettings) -> DocxResult<Vec<u8>> {
        Ok(self.save(Cursor::new(Vec::new()), settings)?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::content_type_values;

    #[test]
    fn test_blank_package_shape() {
        let package = Package::new_blank();

        assert_eq!(package.main_document_part().unwrap(), "word/document.xml");
        assert!(package.contains_part("word/styles.xml"));
        assert_eq!(
            package.content_type("word/document.xml"),
            Some(content_type_values::DOCUMENT)
        );
        assert_eq!(
            package.related_parts("word/document.xml", relationship_types::STYLES)[0].1,
            "word/styles.xml"
        );
    }

    #[test]
    fn test_save_and_reopen() {
        let mut package = Package::new_blank();
        package
            .create_part("word/header1.xml", content_type_values::HEADER, b"<w:hdr/>".to_vec())
            .unwrap();
        let id = package.create_relationship(
            "word/document.xml",
            relationship_types::HEADER,
            "header1.xml",
            TargetMode::Internal,
        );
        package
            .create_part("word/media/image1.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
            .unwrap();

        let bytes = package.to_bytes(&PackageSettings::default()).unwrap();
        let reopened = Package::from_bytes(&bytes).unwrap();

        assert_eq!(reopened.relationship_part("word/document.xml", &id).unwrap(), "word/header1.xml");
        assert_eq!(reopened.require_part("word/header1.xml").unwrap().read().unwrap(), b"<w:hdr/>");
        assert_eq!(
            reopened.require_part("word/media/image1.png").unwrap().read().unwrap(),
            vec![0x89, 0x50, 0x4e, 0x47]
        );
        assert_eq!(reopened.content_type("word/header1.xml"), Some(content_type_values::HEADER));
    }

    #[test]
    fn test_duplicate_and_delete_part() {
        let mut package = Package::new_blank();
        assert!(matches!(
            package.create_part("/word/document.xml", content_type_values::DOCUMENT, Vec::new()),
            Err(DocxError::DuplicatePart(_))
        ));

        package
            .create_part("word/footer1.xml", content_type_values::FOOTER, Vec::new())
            .unwrap();
        assert!(package.delete_part("word/footer1.xml"));
        assert!(!package.delete_part("word/footer1.xml"));
        assert_eq!(package.content_types().overrides.get("/word/footer1.xml"), None);
    }

    #[test]
    fn test_relationship_lifecycle() {
        let mut package = Package::new_blank();
        let id = package.create_relationship(
            "word/document.xml",
            relationship_types::HYPERLINK,
            "https://example.com",
            TargetMode::External,
        );

        assert!(package.relationship_part("word/document.xml", &id).is_err());
        assert!(package.delete_relationship("word/document.xml", &id));
        assert!(!package.delete_relationship("word/document.xml", &id));
        assert!(package.relationship_part("word/document.xml", "rId99").is_err());
    }

    #[test]
    fn test_part_write_replaces_stream() {
        let package = Package::new_blank();
        let part = package.require_part("word/document.xml").unwrap();
        part.write(b"<w:document/>".to_vec()).unwrap();
        assert_eq!(part.read().unwrap(), b"<w:document/>");
    }

    #[test]
    fn test_next_part_name() {
        let mut package = Package::new_blank();
        assert_eq!(package.next_part_name("word/header", ".xml"), "word/header1.xml");
        package
            .create_part("word/header1.xml", content_type_values::HEADER, Vec::new())
            .unwrap();
        assert_eq!(package.next_part_name("word/header", ".xml"), "word/header2.xml");
    }

    #[test]
    fn test_open_rejects_non_package() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(Package::from_bytes(&bytes), Err(DocxError::MissingPart(_))));
        assert!(Package::from_bytes(b"not a zip").is_err());
    }
}
