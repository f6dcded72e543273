//! ZIP archive reading and XML event helpers

use crate::docx::error::{DocxError, DocxResult};
use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading packages
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Create a new package reader from a source that implements Read + Seek
    pub fn new(reader: R) -> DocxResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a file from the archive as bytes
    pub fn read_file_as_bytes(&mut self, path: &str) -> DocxResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                DocxError::MissingPart(path.to_string())
            } else {
                DocxError::from(e)
            }
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read every file entry in archive order, skipping directories
    pub fn read_all(&mut self) -> DocxResult<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut contents)?;
            entries.push((file.name().to_string(), contents));
        }
        Ok(entries)
    }

    /// Check if a file exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Check if this looks like a WordprocessingML package
    pub fn is_valid_docx(&self) -> bool {
        self.file_exists("[Content_Types].xml") && self.file_exists("_rels/.rels")
    }
}

/// XML reader utilities for package bookkeeping parts
pub struct XmlParser;

impl XmlParser {
    /// Create a new XML reader from a string
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        reader
    }

    /// Get an unescaped attribute value from an event
    pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .map(|a| match a.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            })
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        name_str == expected || name_str.ends_with(&format!(":{}", expected))
    }
}

/// Escape text for use in an XML attribute or text node
pub fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_read_all_preserves_order() {
        let bytes = archive(&[("b.xml", "<b/>"), ("a.xml", "<a/>")]);
        let mut reader = DocxReader::new(Cursor::new(bytes)).unwrap();

        let entries = reader.read_all().unwrap();
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b.xml", "a.xml"]);
        assert_eq!(entries[1].1, b"<a/>");
    }

    #[test]
    fn test_missing_part() {
        let bytes = archive(&[("a.xml", "<a/>")]);
        let mut reader = DocxReader::new(Cursor::new(bytes)).unwrap();

        assert!(matches!(
            reader.read_file_as_bytes("word/document.xml"),
            Err(DocxError::MissingPart(_))
        ));
        assert!(!reader.is_valid_docx());
    }

    #[test]
    fn test_matches_element() {
        assert!(XmlParser::matches_element(b"Relationship", "Relationship"));
        assert!(XmlParser::matches_element(b"pr:Relationship", "Relationship"));
        assert!(!XmlParser::matches_element(b"Override", "Default"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a&b<c>\"d\""), "a&amp;b&lt;c&gt;&quot;d&quot;");
    }
}
