//! Document facade
//!
//! `Document` owns the package, the arena every loaded part lives in and the
//! containers over the body, headers and footers. Document-wide operations
//! visit the body first, then headers, footers, footnotes and endnotes.

use crate::header_footer::{self, HeaderFooter, HeaderFooterKind, HeaderFooterType};
use crate::notes::{self, Note, NoteKind};
use crate::{
    Bookmark, Container, ContainerKind, EditError, List, Paragraph, ReplaceTextOptions, Result, Section,
    StringReplaceTextOptions, Table,
};
use doc_model::{names, numbering, Formatting, ListItemType, NodeId, XmlTree};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use store::docx::{content_type_values, relationship_types, relative_target, template, xml_io};
use store::{DocxError, EngineSettings, Package, SettingsManager, TargetMode};
use tracing::{debug, warn};

const NUMBERING_PART: &str = "word/numbering.xml";

/// An open WordprocessingML document
#[derive(Debug)]
pub struct Document {
    package: Package,
    tree: XmlTree,
    main_part: String,
    body: Container,
    headers: Vec<HeaderFooter>,
    footers: Vec<HeaderFooter>,
    settings: EngineSettings,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Result<Self> {
        Self::load(Package::new_blank(), EngineSettings::default())
    }

    /// Open a document from disk
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the .docx file
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The loaded document
    /// * `Err(EditError)` - If the file cannot be read or is not a valid package
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let package = Package::open(BufReader::new(file))?;
        Self::load(package, EngineSettings::default())
    }

    /// Open a document from the bytes of a .docx file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(Package::from_bytes(bytes)?, EngineSettings::default())
    }

    /// Apply engine settings (revision author, replace defaults, compression)
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        let author = settings.revisions.author.clone();
        self.body.set_revision_author(author.clone());
        for part in self.headers.iter_mut().chain(self.footers.iter_mut()) {
            part.container_mut().set_revision_author(author.clone());
        }
        self.settings = settings;
        self
    }

    /// Apply the settings saved under a configuration directory, or the
    /// defaults when none were saved
    pub fn with_settings_from(self, manager: &mut SettingsManager) -> Result<Self> {
        let settings = manager.load()?.clone();
        debug!(path = %manager.settings_path().display(), "applying stored settings");
        Ok(self.with_settings(settings))
    }

    fn load(package: Package, settings: EngineSettings) -> Result<Self> {
        let mut tree = XmlTree::new();
        let main_part = package.main_document_part()?;
        let document_root = load_part(&package, &mut tree, &main_part)?;
        let body_root = tree
            .first_child_named(document_root, names::BODY)
            .ok_or_else(|| DocxError::InvalidStructure(format!("{} has no w:body", main_part)))?;

        for rel_type in [
            relationship_types::NUMBERING,
            relationship_types::FOOTNOTES,
            relationship_types::ENDNOTES,
        ] {
            for (id, part) in package.related_parts(&main_part, rel_type) {
                if package.contains_part(&part) {
                    load_part(&package, &mut tree, &part)?;
                } else {
                    warn!(relationship = %id, part = %part, "dangling relationship");
                }
            }
        }

        let author = settings.revisions.author.clone();
        let load_headers = |kind: HeaderFooterType, tree: &mut XmlTree| -> Result<Vec<HeaderFooter>> {
            let mut loaded = Vec::new();
            for (id, part) in package.related_parts(&main_part, kind.relationship_type()) {
                if !package.contains_part(&part) {
                    warn!(relationship = %id, part = %part, "dangling relationship");
                    continue;
                }
                let root = load_part(&package, tree, &part)?;
                let mut header = HeaderFooter::new(kind, part, id, root);
                header.container_mut().set_revision_author(author.clone());
                loaded.push(header);
            }
            Ok(loaded)
        };
        let headers = load_headers(HeaderFooterType::Header, &mut tree)?;
        let footers = load_headers(HeaderFooterType::Footer, &mut tree)?;

        debug!(
            main_part = %main_part,
            headers = headers.len(),
            footers = footers.len(),
            "loaded document"
        );
        Ok(Self {
            body: Container::new(ContainerKind::Body, body_root).with_revision_author(author),
            package,
            tree,
            main_part,
            headers,
            footers,
            settings,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    /// Mutable arena, for building detached content such as list items
    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Name of the main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn body(&self) -> &Container {
        &self.body
    }

    /// The body container together with the arena it edits
    pub fn body_mut(&mut self) -> (&mut Container, &mut XmlTree) {
        (&mut self.body, &mut self.tree)
    }

    pub fn headers(&self) -> &[HeaderFooter] {
        &self.headers
    }

    pub fn footers(&self) -> &[HeaderFooter] {
        &self.footers
    }

    /// A header or footer together with the arena it edits
    pub fn header_footer_mut(
        &mut self,
        kind: HeaderFooterType,
        index: usize,
    ) -> Option<(&mut Container, &mut XmlTree)> {
        let parts = match kind {
            HeaderFooterType::Header => &mut self.headers,
            HeaderFooterType::Footer => &mut self.footers,
        };
        let part = parts.get_mut(index)?;
        Some((part.container_mut(), &mut self.tree))
    }

    // =========================================================================
    // Body paragraphs
    // =========================================================================

    pub fn paragraphs(&mut self) -> Vec<Paragraph> {
        self.body.paragraphs(&self.tree).to_vec()
    }

    /// Body text, paragraphs joined by newlines
    pub fn text(&mut self) -> String {
        self.body.text(&self.tree)
    }

    pub fn insert_paragraph(&mut self, content: &str, formatting: Option<&Formatting>) -> Result<Paragraph> {
        self.body.insert_paragraph(&mut self.tree, content, formatting)
    }

    pub fn insert_paragraph_at(
        &mut self,
        index: usize,
        content: &str,
        formatting: Option<&Formatting>,
    ) -> Result<Paragraph> {
        self.body.insert_paragraph_at(&mut self.tree, index, content, formatting)
    }

    pub fn remove_paragraph_at(&mut self, position: usize) -> Result<bool> {
        self.body.remove_paragraph_at(&mut self.tree, position)
    }

    pub fn remove_paragraph(&mut self, paragraph: &Paragraph, track_changes: bool) -> Result<()> {
        self.body.remove_paragraph(&mut self.tree, paragraph, track_changes)
    }

    // =========================================================================
    // Document-wide text operations
    // =========================================================================

    /// String replacement options carrying the configured defaults
    pub fn replace_options(
        &self,
        search_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> StringReplaceTextOptions {
        StringReplaceTextOptions::new(search_value, new_value)
            .escape_regex(self.settings.editing.escape_regex)
            .remove_empty_paragraph(self.settings.editing.remove_empty_paragraphs)
    }

    /// Run `visit` over the body, headers, footers and notes in that order.
    /// With `stop_at_first` the walk ends at the first container for which
    /// `visit` returns true.
    fn visit_containers<F>(&mut self, stop_at_first: bool, mut visit: F) -> Result<bool>
    where
        F: FnMut(&mut Container, &mut XmlTree) -> Result<bool>,
    {
        let mut note_containers = self.note_containers();
        let Self {
            tree,
            body,
            headers,
            footers,
            ..
        } = self;

        let containers = std::iter::once(body)
            .chain(headers.iter_mut().map(HeaderFooter::container_mut))
            .chain(footers.iter_mut().map(HeaderFooter::container_mut))
            .chain(note_containers.iter_mut());

        let mut any = false;
        for container in containers {
            if visit(container, tree)? {
                any = true;
                if stop_at_first {
                    break;
                }
            }
        }
        Ok(any)
    }

    fn note_containers(&self) -> Vec<Container> {
        let author = &self.settings.revisions.author;
        [NoteKind::Footnote, NoteKind::Endnote]
            .into_iter()
            .filter_map(|kind| Some((kind, self.notes_root(kind)?)))
            .flat_map(|(kind, root)| notes::notes(&self.tree, kind, root, author))
            .map(|note| note.container().clone())
            .collect()
    }

    /// Replace text across the whole document. Returns whether anything was
    /// replaced; `stop_after_one_replacement` holds across containers.
    pub fn replace_text<O: ReplaceTextOptions + ?Sized>(&mut self, options: &O) -> Result<bool> {
        let stop = options.options().stop_after_one_replacement;
        let replaced = self.visit_containers(stop, |container, tree| container.replace_text(tree, options))?;
        debug!(replaced, "document replace finished");
        Ok(replaced)
    }

    /// Bookmarks of every container
    pub fn bookmarks(&mut self) -> Result<Vec<Bookmark>> {
        let mut found = Vec::new();
        self.visit_containers(false, |container, tree| {
            found.extend(container.bookmarks(tree));
            Ok(false)
        })?;
        Ok(found)
    }

    pub fn insert_at_bookmark(&mut self, content: &str, name: &str, formatting: Option<&Formatting>) -> Result<bool> {
        self.visit_containers(false, |container, tree| {
            container.insert_at_bookmark(tree, content, name, formatting)
        })
    }

    pub fn replace_at_bookmark(&mut self, content: &str, name: &str, formatting: Option<&Formatting>) -> Result<bool> {
        self.visit_containers(false, |container, tree| {
            container.replace_at_bookmark(tree, content, name, formatting)
        })
    }

    pub fn remove_bookmark(&mut self, name: &str) -> Result<bool> {
        self.visit_containers(false, |container, tree| container.remove_bookmark(tree, name))
    }

    /// Names from `names` with no bookmark anywhere in the document
    pub fn validate_bookmarks(&mut self, names: &[&str]) -> Result<Vec<String>> {
        let mut missing: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.visit_containers(false, |container, tree| {
            let candidates: Vec<&str> = missing.iter().map(String::as_str).collect();
            let still_missing = container.validate_bookmarks(tree, &candidates);
            missing = still_missing;
            Ok(false)
        })?;
        Ok(missing)
    }

    // =========================================================================
    // Tables and lists
    // =========================================================================

    pub fn tables(&self) -> Vec<Table> {
        self.body.tables(&self.tree)
    }

    pub fn insert_table(&mut self, rows: usize, cols: usize) -> Result<Table> {
        self.body.insert_table(&mut self.tree, rows, cols)
    }

    pub fn insert_table_at(&mut self, index: usize, rows: usize, cols: usize) -> Result<Table> {
        self.body.insert_table_at(&mut self.tree, index, rows, cols)
    }

    pub fn remove_table(&mut self, table: &Table) -> Result<()> {
        self.body.remove_table(&mut self.tree, table)
    }

    pub fn lists(&mut self) -> Vec<List> {
        self.body.lists(&self.tree)
    }

    /// Create a list definition in the numbering part and return an empty
    /// list using it
    pub fn add_list(&mut self, item_type: ListItemType, start: u32) -> Result<List> {
        let numbering_root = self.ensure_part(
            names::NUMBERING,
            NUMBERING_PART,
            content_type_values::NUMBERING,
            relationship_types::NUMBERING,
            template::NUMBERING_XML,
        )?;
        let num_id = numbering::add_list_definition(&mut self.tree, numbering_root, item_type, start)?;
        debug!(num_id, ?item_type, "added list definition");
        Ok(List::new(num_id, item_type))
    }

    pub fn insert_list(&mut self, list: &List) -> Result<List> {
        self.body.insert_list(&mut self.tree, list)
    }

    // =========================================================================
    // Sections, headers and footers
    // =========================================================================

    pub fn sections(&mut self) -> Vec<Section> {
        self.body.sections(&self.tree)
    }

    pub fn insert_section(&mut self, page_break: bool) -> Result<Section> {
        self.body.insert_section(&mut self.tree, page_break)
    }

    pub fn remove_section(&mut self, index: usize) -> Result<()> {
        self.body.remove_section(&mut self.tree, index)
    }

    /// Add a header to a section. An existing header of the same page kind
    /// is returned as is.
    pub fn add_header(&mut self, section: usize, page: HeaderFooterKind) -> Result<&mut HeaderFooter> {
        self.add_header_footer(HeaderFooterType::Header, section, page)
    }

    /// Add a footer to a section. An existing footer of the same page kind
    /// is returned as is.
    pub fn add_footer(&mut self, section: usize, page: HeaderFooterKind) -> Result<&mut HeaderFooter> {
        self.add_header_footer(HeaderFooterType::Footer, section, page)
    }

    fn add_header_footer(
        &mut self,
        kind: HeaderFooterType,
        section: usize,
        page: HeaderFooterKind,
    ) -> Result<&mut HeaderFooter> {
        let sections = self.body.sections(&self.tree);
        let target = sections.get(section).ok_or_else(|| {
            EditError::OutOfRange(format!("section index {} outside 0..{}", section, sections.len()))
        })?;
        let sect_pr = match target.section_properties() {
            Some(sect_pr) => sect_pr,
            None => self.body.ensure_body_section_properties(&mut self.tree)?,
        };

        let existing_id = header_footer::references(&self.tree, sect_pr, kind)
            .into_iter()
            .find(|(existing, _)| *existing == page)
            .map(|(_, id)| id);
        let existing = existing_id.and_then(|id| {
            self.parts(kind).iter().position(|part| part.relationship_id() == id)
        });

        let position = match existing {
            Some(position) => position,
            None => {
                let part_name = self.package.next_part_name(kind.part_prefix(), ".xml");
                self.package
                    .create_part(&part_name, kind.content_type(), kind.template().as_bytes().to_vec())?;
                let target = relative_target(&self.main_part, &part_name);
                let id = self.package.create_relationship(
                    &self.main_part,
                    kind.relationship_type(),
                    &target,
                    TargetMode::Internal,
                );
                let root = xml_io::parse_part(&mut self.tree, kind.template().as_bytes())?;
                self.tree.set_part_root(&part_name, root);
                header_footer::set_reference(&mut self.tree, sect_pr, kind, page, &id)?;
                debug!(part = %part_name, relationship = %id, ?page, "added {:?}", kind);

                let mut part = HeaderFooter::new(kind, part_name, id, root);
                part.container_mut()
                    .set_revision_author(self.settings.revisions.author.clone());
                let parts = self.parts_mut(kind);
                parts.push(part);
                parts.len() - 1
            }
        };
        Ok(&mut self.parts_mut(kind)[position])
    }

    fn parts(&self, kind: HeaderFooterType) -> &[HeaderFooter] {
        match kind {
            HeaderFooterType::Header => &self.headers,
            HeaderFooterType::Footer => &self.footers,
        }
    }

    fn parts_mut(&mut self, kind: HeaderFooterType) -> &mut Vec<HeaderFooter> {
        match kind {
            HeaderFooterType::Header => &mut self.headers,
            HeaderFooterType::Footer => &mut self.footers,
        }
    }

    // =========================================================================
    // Notes
    // =========================================================================

    fn notes_root(&self, kind: NoteKind) -> Option<NodeId> {
        self.tree.part_with_root(kind.root_name()).map(|(_, root)| root)
    }

    /// Footnotes or endnotes of the document, separator notes excluded
    pub fn notes(&self, kind: NoteKind) -> Vec<Note> {
        match self.notes_root(kind) {
            Some(root) => notes::notes(&self.tree, kind, root, &self.settings.revisions.author),
            None => Vec::new(),
        }
    }

    /// Add a note with `content` and reference it at the end of `paragraph`.
    /// The notes part is created on first use.
    pub fn insert_note(&mut self, kind: NoteKind, paragraph: &Paragraph, content: &str) -> Result<Note> {
        let root = self.ensure_part(
            kind.root_name(),
            kind.part_name(),
            kind.content_type(),
            kind.relationship_type(),
            kind.template(),
        )?;
        let note = notes::insert_note(
            &mut self.tree,
            kind,
            root,
            paragraph,
            content,
            &self.settings.revisions.author,
        )?;
        self.body.mark_paragraph_indexes_stale();
        Ok(note)
    }

    /// Root of a part related to the main part, creating the part, its
    /// content type and the relationship when missing
    fn ensure_part(
        &mut self,
        root_name: &str,
        part_name: &str,
        content_type: &str,
        rel_type: &str,
        markup: &str,
    ) -> Result<NodeId> {
        if let Some((_, root)) = self.tree.part_with_root(root_name) {
            return Ok(root);
        }
        if !self.package.contains_part(part_name) {
            self.package
                .create_part(part_name, content_type, markup.as_bytes().to_vec())?;
        }
        if self.package.related_parts(&self.main_part, rel_type).is_empty() {
            let target = relative_target(&self.main_part, part_name);
            self.package
                .create_relationship(&self.main_part, rel_type, &target, TargetMode::Internal);
        }
        load_part(&self.package, &mut self.tree, part_name)
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Serialize every loaded part back into the package
    fn flush(&self) -> Result<()> {
        let roots: Vec<(String, NodeId)> = self
            .tree
            .parts()
            .map(|(name, root)| (name.to_string(), root))
            .collect();
        for (name, root) in roots {
            let bytes = xml_io::serialize_part(&self.tree, root)?;
            self.package.require_part(&name)?.write(bytes)?;
        }
        Ok(())
    }

    /// Save the document to disk
    ///
    /// # Arguments
    ///
    /// * `path` - Destination of the .docx file; missing parent directories
    ///   are created
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.flush()?;
        let file = File::create(path)?;
        let mut writer = self.package.save(BufWriter::new(file), &self.settings.package)?;
        writer.flush()?;
        debug!(path = %path.display(), "saved document");
        Ok(())
    }

    /// The document as .docx bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.flush()?;
        Ok(self.package.to_bytes(&self.settings.package)?)
    }
}

fn load_part(package: &Package, tree: &mut XmlTree, name: &str) -> Result<NodeId> {
    let bytes = package.require_part(name)?.read()?;
    let root = xml_io::parse_part(tree, &bytes)?;
    tree.set_part_root(name, root);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let mut doc = Document::new().unwrap();

        assert!(doc.paragraphs().is_empty());
        assert_eq!(doc.sections().len(), 1);
        assert!(doc.headers().is_empty());
        assert_eq!(doc.main_part(), "word/document.xml");
    }

    #[test]
    fn test_paragraphs_stay_before_body_properties() {
        let mut doc = Document::new().unwrap();
        doc.insert_paragraph("one", None).unwrap();
        doc.insert_paragraph("two", None).unwrap();

        let body = doc.body().root();
        let last = doc.tree().children(body).last().copied().unwrap();
        assert!(doc.tree().is(last, names::SECT_PR));
        assert_eq!(doc.text(), "one\ntwo");
    }

    #[test]
    fn test_add_header_creates_part_and_reference() {
        let mut doc = Document::new().unwrap();

        let header = doc.add_header(0, HeaderFooterKind::Default).unwrap();
        let part_name = header.part_name().to_string();
        let id = header.relationship_id().to_string();

        assert_eq!(part_name, "word/header1.xml");
        assert_eq!(doc.package().content_type(&part_name), Some(content_type_values::HEADER));
        let sections = doc.sections();
        assert_eq!(sections[0].headers(doc.tree()), vec![(HeaderFooterKind::Default, id.clone())]);

        // asking again returns the same part
        let again = doc.add_header(0, HeaderFooterKind::Default).unwrap();
        assert_eq!(again.relationship_id(), id);
        assert_eq!(doc.headers().len(), 1);
    }

    #[test]
    fn test_replace_reaches_headers() {
        let mut doc = Document::new().unwrap();
        doc.insert_paragraph("Draft body", None).unwrap();
        doc.add_footer(0, HeaderFooterKind::Default).unwrap();
        {
            let (footer, tree) = doc.header_footer_mut(HeaderFooterType::Footer, 0).unwrap();
            footer.insert_paragraph(tree, "Draft footer", None).unwrap();
        }

        let options = doc.replace_options("Draft", "Final");
        assert!(doc.replace_text(&options).unwrap());

        assert_eq!(doc.text(), "Final body");
        let (footer, tree) = doc.header_footer_mut(HeaderFooterType::Footer, 0).unwrap();
        assert_eq!(footer.text(tree), "\nFinal footer");
    }

    #[test]
    fn test_stop_after_one_across_containers() {
        let mut doc = Document::new().unwrap();
        doc.insert_paragraph("x", None).unwrap();
        doc.add_header(0, HeaderFooterKind::Default).unwrap();
        {
            let (header, tree) = doc.header_footer_mut(HeaderFooterType::Header, 0).unwrap();
            header.insert_paragraph(tree, "x", None).unwrap();
        }

        let options = StringReplaceTextOptions::new("x", "y").stop_after_one_replacement(true);
        doc.replace_text(&options).unwrap();

        assert_eq!(doc.text(), "y");
        let (header, tree) = doc.header_footer_mut(HeaderFooterType::Header, 0).unwrap();
        assert_eq!(header.text(tree), "\nx");
    }

    #[test]
    fn test_notes_and_lists_create_parts() {
        let mut doc = Document::new().unwrap();
        let paragraph = doc.insert_paragraph("Claim", None).unwrap();

        let note = doc.insert_note(NoteKind::Endnote, &paragraph, "Evidence").unwrap();
        assert_eq!(note.id(), 1);
        assert!(doc.package().contains_part("word/endnotes.xml"));
        assert_eq!(doc.notes(NoteKind::Endnote).len(), 1);
        assert!(doc.notes(NoteKind::Footnote).is_empty());

        let mut list = doc.add_list(ListItemType::Bulleted, 1).unwrap();
        list.add_item(doc.tree_mut(), "item", 0, None).unwrap();
        doc.insert_list(&list).unwrap();
        let lists = doc.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].item_type(), ListItemType::Bulleted);
    }

    #[test]
    fn test_validate_bookmarks_across_parts() {
        let mut doc = Document::new().unwrap();
        let paragraph = doc.insert_paragraph("Body text", None).unwrap();
        {
            let (body, tree) = doc.body_mut();
            body.insert_bookmark(tree, &paragraph, "InBody", 0, 4).unwrap();
        }
        doc.add_header(0, HeaderFooterKind::Default).unwrap();
        {
            let (header, tree) = doc.header_footer_mut(HeaderFooterType::Header, 0).unwrap();
            let p = header.insert_paragraph(tree, "Heading", None).unwrap();
            header.insert_bookmark(tree, &p, "InHeader", 0, 7).unwrap();
        }

        assert!(doc.validate_bookmarks(&["InBody", "InHeader"]).unwrap().is_empty());
        assert_eq!(doc.validate_bookmarks(&["InHeader", "Gone"]).unwrap(), vec!["Gone".to_string()]);
        assert_eq!(doc.bookmarks().unwrap().len(), 2);
        assert!(doc.replace_at_bookmark("Title", "inheader", None).unwrap());
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut doc = Document::new().unwrap();
        doc.insert_paragraph("Persisted", Some(&Formatting::new().bold(true))).unwrap();
        doc.insert_table(2, 2).unwrap();
        doc.add_header(0, HeaderFooterKind::First).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let mut reopened = Document::from_bytes(&bytes).unwrap();

        assert_eq!(reopened.paragraphs()[0].text(reopened.tree()), "Persisted");
        assert_eq!(reopened.tables().len(), 1);
        assert_eq!(reopened.headers().len(), 1);
        let sections = reopened.sections();
        assert_eq!(sections[0].headers(reopened.tree())[0].0, HeaderFooterKind::First);
    }
}
