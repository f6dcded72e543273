//! Containers and their paragraph cache
//!
//! A `Container` is a structural scope (the body, a cell, a header, a note)
//! rooted at one element of the arena. It caches the paragraph index of its
//! subtree and decides when the cache has to be rebuilt:
//!
//! - the cache is rebuilt when it is empty or the arena's block generation
//!   moved (paragraphs or tables were attached or detached anywhere);
//! - offsets are refreshed in place when only content changed, unless a batch
//!   operation suppressed refreshing with `prevent_update_paragraph_indexes`.

use crate::paragraph_index::{self, compute_offsets, paragraph_nodes};
use crate::splitter::split_paragraph;
use crate::{revision, run_edit, ContainerKind, EditError, Paragraph, RegexOptions, Result, RevisionIds, RevisionInfo};
use doc_model::{elements, names, text, Formatting, NodeId, XmlTree};
use tracing::{debug, trace};

/// Owner of a cached paragraph list for one structural scope
#[derive(Debug, Clone)]
pub struct Container {
    kind: ContainerKind,
    root: NodeId,
    paragraphs: Vec<Paragraph>,
    cache_generation: u64,
    need_refresh_paragraph_indexes: bool,
    prevent_update_paragraph_indexes: bool,
    revision_author: String,
}

impl Container {
    /// Create a container over the subtree rooted at `root`
    pub fn new(kind: ContainerKind, root: NodeId) -> Self {
        Self {
            kind,
            root,
            paragraphs: Vec::new(),
            cache_generation: 0,
            need_refresh_paragraph_indexes: true,
            prevent_update_paragraph_indexes: false,
            revision_author: "Author".to_string(),
        }
    }

    /// Set the author recorded on tracked changes
    pub fn with_revision_author(mut self, author: impl Into<String>) -> Self {
        self.revision_author = author.into();
        self
    }

    /// Change the author recorded on tracked changes
    pub fn set_revision_author(&mut self, author: impl Into<String>) {
        self.revision_author = author.into();
    }

    /// Which kind of scope this is
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Root element of the scope
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Author recorded on tracked changes
    pub fn revision_author(&self) -> &str {
        &self.revision_author
    }

    /// Whether cached offsets may be behind the tree
    pub fn need_refresh_paragraph_indexes(&self) -> bool {
        self.need_refresh_paragraph_indexes
    }

    /// Whether offset refreshes are suppressed
    pub fn prevent_update_paragraph_indexes(&self) -> bool {
        self.prevent_update_paragraph_indexes
    }

    /// Suppress (or re-enable) offset refreshes for a batch of edits
    pub fn set_prevent_update_paragraph_indexes(&mut self, prevent: bool) {
        self.prevent_update_paragraph_indexes = prevent;
    }

    // =========================================================================
    // Paragraph cache
    // =========================================================================

    /// Paragraphs of the scope in document order
    pub fn paragraphs(&mut self, tree: &XmlTree) -> &[Paragraph] {
        if !self.is_cache_current(tree) {
            self.rebuild(tree);
        } else if !self.prevent_update_paragraph_indexes && self.offsets_outdated(tree) {
            self.copy_live_offsets(tree);
        }
        &self.paragraphs
    }

    /// Number of paragraphs in the scope
    pub fn paragraph_count(&mut self, tree: &XmlTree) -> usize {
        self.paragraphs(tree).len()
    }

    /// Paragraph covering a logical offset
    pub fn paragraph_at_index(&mut self, tree: &XmlTree, index: usize) -> Option<Paragraph> {
        self.paragraphs(tree).iter().find(|p| p.covers(index)).cloned()
    }

    /// Flag offsets as stale without dropping the cache
    pub(crate) fn mark_paragraph_indexes_stale(&mut self) {
        self.need_refresh_paragraph_indexes = true;
    }

    /// Drop the cache; the next access rebuilds it
    pub fn clear_paragraphs_cache(&mut self) {
        self.paragraphs.clear();
        self.need_refresh_paragraph_indexes = true;
    }

    /// Recompute offsets against the live tree and copy them into the cached
    /// paragraphs by position
    pub fn refresh_paragraph_indexes(&mut self, tree: &XmlTree) {
        if self.is_cache_current(tree) {
            self.copy_live_offsets(tree);
        } else {
            self.rebuild(tree);
        }
    }

    fn is_cache_current(&self, tree: &XmlTree) -> bool {
        !self.paragraphs.is_empty() && self.cache_generation == tree.block_generation()
    }

    fn offsets_outdated(&self, tree: &XmlTree) -> bool {
        self.need_refresh_paragraph_indexes
            || self
                .paragraphs
                .first()
                .is_some_and(|p| p.generation != tree.content_generation())
    }

    fn rebuild(&mut self, tree: &XmlTree) {
        let mut paragraphs = paragraph_index::build_index(tree, self.root, self.kind);
        paragraph_index::enrich(tree, &mut paragraphs, self.kind);
        debug!(kind = ?self.kind, paragraphs = paragraphs.len(), "rebuilt paragraph cache");
        self.paragraphs = paragraphs;
        self.cache_generation = tree.block_generation();
        self.need_refresh_paragraph_indexes = false;
    }

    fn copy_live_offsets(&mut self, tree: &XmlTree) {
        let nodes = paragraph_nodes(tree, self.root);
        let offsets = compute_offsets(tree, &nodes);
        let generation = tree.content_generation();
        // never index past the cache
        for (paragraph, (start, end)) in self.paragraphs.iter_mut().zip(offsets) {
            paragraph.start_index = start;
            paragraph.end_index = end;
            paragraph.generation = generation;
        }
        trace!(kind = ?self.kind, "refreshed paragraph offsets");
        self.need_refresh_paragraph_indexes = false;
    }

    /// Find the freshly indexed paragraph for a node
    pub(crate) fn paragraph_for_node(&mut self, tree: &XmlTree, node: NodeId) -> Result<Paragraph> {
        self.paragraphs(tree)
            .iter()
            .find(|p| p.node() == node)
            .cloned()
            .ok_or_else(|| EditError::InvalidArgument("paragraph is not part of this container".to_string()))
    }

    // =========================================================================
    // Block insertion
    // =========================================================================

    /// Append a paragraph at the end of the scope
    pub fn insert_paragraph(
        &mut self,
        tree: &mut XmlTree,
        content: &str,
        formatting: Option<&Formatting>,
    ) -> Result<Paragraph> {
        self.check_accepts_paragraphs()?;
        let node = elements::paragraph(tree, content, formatting)?;
        self.append_block(tree, node)?;
        self.clear_paragraphs_cache();
        self.paragraph_for_node(tree, node)
    }

    /// Insert a paragraph at a logical offset. The paragraph covering the
    /// offset is split there and the new paragraph goes between the halves;
    /// an offset equal to the paragraph start inserts before it.
    pub fn insert_paragraph_at(
        &mut self,
        tree: &mut XmlTree,
        index: usize,
        content: &str,
        formatting: Option<&Formatting>,
    ) -> Result<Paragraph> {
        self.check_accepts_paragraphs()?;
        self.check_insert_index(tree, index)?;
        let node = elements::paragraph(tree, content, formatting)?;
        self.insert_blocks_at(tree, index, &[node])?;
        self.paragraph_for_node(tree, node)
    }

    fn check_accepts_paragraphs(&self) -> Result<()> {
        if self.kind == ContainerKind::Table {
            return Err(EditError::OperationNotAllowed(
                "paragraphs cannot be placed directly in a table".to_string(),
            ));
        }
        Ok(())
    }

    /// Fail when nothing can be inserted at `index`: the offset is neither
    /// covered by a paragraph nor the end of the container. Callers check
    /// before building the nodes to insert.
    pub(crate) fn check_insert_index(&mut self, tree: &XmlTree, index: usize) -> Result<()> {
        let paragraphs = self.paragraphs(tree);
        let total = paragraphs.last().map(|p| p.end_index + 1).unwrap_or(0);
        if paragraphs.is_empty() || index <= total {
            return Ok(());
        }
        Err(EditError::OutOfRange(format!(
            "no paragraph covers index {} (container length {})",
            index, total
        )))
    }

    /// Place detached block nodes at a logical offset
    pub(crate) fn insert_blocks_at(&mut self, tree: &mut XmlTree, index: usize, blocks: &[NodeId]) -> Result<()> {
        self.check_insert_index(tree, index)?;
        let paragraphs = self.paragraphs(tree).to_vec();

        match paragraphs.iter().find(|p| p.covers(index)) {
            Some(target) if index == target.start_index => {
                for block in blocks {
                    tree.insert_before(target.node(), *block)?;
                }
            }
            Some(target) => {
                let split = split_paragraph(tree, target.node(), index - target.start_index)?;
                let mut sequence = Vec::with_capacity(blocks.len() + 2);
                sequence.push(split.before);
                sequence.extend_from_slice(blocks);
                sequence.push(split.after);
                tree.replace_with(target.node(), &sequence)?;
            }
            None => {
                for block in blocks {
                    self.append_block(tree, *block)?;
                }
            }
        }
        self.clear_paragraphs_cache();
        Ok(())
    }

    /// Append a detached block, keeping a trailing `w:sectPr` last
    pub(crate) fn append_block(&mut self, tree: &mut XmlTree, block: NodeId) -> Result<()> {
        let trailing_sect_pr = tree
            .children(self.root)
            .last()
            .copied()
            .filter(|last| tree.is(*last, names::SECT_PR));
        match trailing_sect_pr {
            Some(sect_pr) => tree.insert_before(sect_pr, block)?,
            None => tree.append_child(self.root, block)?,
        }
        Ok(())
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove the paragraph at a position of the paragraph list. Returns
    /// false when there is no paragraph at that position.
    pub fn remove_paragraph_at(&mut self, tree: &mut XmlTree, position: usize) -> Result<bool> {
        let Some(paragraph) = self.paragraphs(tree).get(position).cloned() else {
            return Ok(false);
        };
        self.remove_paragraph(tree, &paragraph, false)?;
        Ok(true)
    }

    /// Remove a paragraph.
    ///
    /// The sole paragraph of a table cell is blanked instead of removed. With
    /// `track_changes` the paragraph stays in place with its runs and its mark
    /// recorded as tracked deletions.
    pub fn remove_paragraph(&mut self, tree: &mut XmlTree, paragraph: &Paragraph, track_changes: bool) -> Result<()> {
        let node = paragraph.node();
        if !tree.contains(node) || !tree.is_descendant_of(node, self.root) {
            return Err(EditError::InvalidArgument(
                "paragraph is not part of this container".to_string(),
            ));
        }

        if let Some(info) = self.revision(track_changes) {
            let mut ids = RevisionIds::for_node(tree, node);
            for run in text::runs(tree, node) {
                revision::mark_deleted(tree, run, &info, &mut ids)?;
            }
            revision::mark_paragraph_mark_deleted(tree, node, &info, &mut ids)?;
            self.need_refresh_paragraph_indexes = true;
            return Ok(());
        }

        let parent = tree.parent(node);
        if let Some(cell) = parent.filter(|p| tree.is(*p, names::TC)) {
            if tree.children_named(cell, names::P).len() == 1 {
                blank_paragraph(tree, node)?;
                self.need_refresh_paragraph_indexes = true;
                return Ok(());
            }
        }

        tree.remove(node)?;
        if let Some(cell) = parent.filter(|p| tree.is(*p, names::TC)) {
            ensure_cell_ends_with_paragraph(tree, cell)?;
        }
        self.clear_paragraphs_cache();
        Ok(())
    }

    pub(crate) fn revision(&self, track_changes: bool) -> Option<RevisionInfo> {
        track_changes.then(|| RevisionInfo::now(self.revision_author.clone()))
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Insert text at a character offset of a paragraph of this container
    pub fn insert_text(
        &mut self,
        tree: &mut XmlTree,
        paragraph: &Paragraph,
        offset: usize,
        content: &str,
        formatting: Option<&Formatting>,
        track_changes: bool,
    ) -> Result<()> {
        let revision = self.revision(track_changes);
        run_edit::insert_text(tree, paragraph.node(), offset, content, formatting, revision.as_ref())?;
        self.need_refresh_paragraph_indexes = true;
        Ok(())
    }

    /// Remove `count` characters of a paragraph starting at `offset`
    pub fn remove_text(
        &mut self,
        tree: &mut XmlTree,
        paragraph: &Paragraph,
        offset: usize,
        count: usize,
        track_changes: bool,
    ) -> Result<()> {
        let revision = self.revision(track_changes);
        run_edit::remove_text(tree, paragraph.node(), offset, count, revision.as_ref())?;
        self.need_refresh_paragraph_indexes = true;
        Ok(())
    }

    /// Paragraph texts joined by newlines
    pub fn text(&mut self, tree: &XmlTree) -> String {
        self.paragraphs(tree)
            .iter()
            .map(|p| p.text(tree))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Logical offsets of every match of a regular expression
    pub fn find_all(&mut self, tree: &XmlTree, pattern: &str, options: &RegexOptions) -> Result<Vec<usize>> {
        let regex = options.build(pattern)?;
        let mut found = Vec::new();
        for paragraph in self.paragraphs(tree) {
            let content = paragraph.text(tree);
            for m in regex.find_iter(&content).filter(|m| !m.as_str().is_empty()) {
                found.push(paragraph.start_index + text::char_offset(&content, m.start()));
            }
        }
        Ok(found)
    }
}

/// Drop everything but the properties of a paragraph
pub(crate) fn blank_paragraph(tree: &mut XmlTree, paragraph: NodeId) -> Result<()> {
    for child in tree.children(paragraph).to_vec() {
        if !tree.is(child, names::P_PR) {
            tree.remove(child)?;
        }
    }
    Ok(())
}

/// A cell has to end with a paragraph
pub(crate) fn ensure_cell_ends_with_paragraph(tree: &mut XmlTree, cell: NodeId) -> Result<()> {
    let last = tree.child_elements(cell).last();
    if !last.is_some_and(|last| tree.is(last, names::P)) {
        let p = tree.create_element(names::P);
        tree.append_child(cell, p)?;
    }
    Ok(())
}
