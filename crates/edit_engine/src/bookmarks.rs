//! Bookmark text operations
//!
//! A bookmark is a `w:bookmarkStart`/`w:bookmarkEnd` pair sharing a `w:id`.
//! Bookmarks are looked up by name inside the container's paragraphs on every
//! call; nothing is indexed. Names compare case-insensitively.

use crate::splitter::ensure_run_boundary;
use crate::{run_edit, Container, EditError, Paragraph, Result};
use doc_model::{elements, names, text, Formatting, NodeId, XmlTree};
use tracing::debug;

/// A named bookmark and the paragraph holding its start marker
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    name: String,
    id: String,
    start: NodeId,
    paragraph: Paragraph,
}

impl Bookmark {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn paragraph(&self) -> &Paragraph {
        &self.paragraph
    }

    /// The `w:bookmarkStart` element
    pub fn start_marker(&self) -> NodeId {
        self.start
    }

    /// Text between the markers, limited to the start marker's paragraph
    pub fn text(&self, tree: &XmlTree) -> String {
        let paragraph = self.paragraph.node();
        let (start, end) = bookmark_range(tree, paragraph, self.start, &self.id);
        text::paragraph_text(tree, paragraph)
            .chars()
            .skip(start)
            .take(end - start)
            .collect()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EditError::InvalidArgument("bookmark name must not be empty".to_string()));
    }
    Ok(())
}

/// `w:bookmarkStart` markers inside a paragraph. Fallbacks and paragraphs
/// nested in text boxes are not part of it.
fn start_markers(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    own_elements_named(tree, paragraph, names::BOOKMARK_START)
}

fn own_elements_named(tree: &XmlTree, paragraph: NodeId, name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    collect_own(tree, paragraph, name, &mut found);
    found
}

fn collect_own(tree: &XmlTree, node: NodeId, name: &str, out: &mut Vec<NodeId>) {
    for child in tree.child_elements(node) {
        if tree.is(child, names::MC_FALLBACK) || tree.is(child, names::TXBX_CONTENT) || tree.is(child, names::P) {
            continue;
        }
        if tree.is(child, name) {
            out.push(child);
        }
        collect_own(tree, child, name, out);
    }
}

/// Character offset of a zero-length marker inside its paragraph
fn marker_offset(tree: &XmlTree, paragraph: NodeId, marker: NodeId) -> usize {
    let mut offset = 0;
    let mut current = marker;
    while current != paragraph {
        let (Some(parent), Some(index)) = (tree.parent(current), tree.index_in_parent(current)) else {
            break;
        };
        offset += tree.children(parent)[..index]
            .iter()
            .map(|sibling| text::node_text_length(tree, *sibling))
            .sum::<usize>();
        current = parent;
    }
    offset
}

/// Character range covered by a bookmark inside the start marker's
/// paragraph. An end marker in a later paragraph extends to the end of it.
fn bookmark_range(tree: &XmlTree, paragraph: NodeId, start: NodeId, id: &str) -> (usize, usize) {
    let from = marker_offset(tree, paragraph, start);
    let end_marker = own_elements_named(tree, paragraph, names::BOOKMARK_END)
        .into_iter()
        .find(|end| tree.attribute(*end, names::ATTR_ID) == Some(id));
    let to = match end_marker {
        Some(end) => marker_offset(tree, paragraph, end),
        None => text::text_length(tree, paragraph),
    };
    (from, to.max(from))
}

/// Properties to give text inserted at `offset`: those of the run that
/// follows it, else those of the run before it
fn neighbour_properties(tree: &mut XmlTree, paragraph: NodeId, offset: usize) -> Result<Option<NodeId>> {
    let spans = text::run_spans(tree, paragraph);
    let neighbour = spans
        .iter()
        .find(|s| s.start >= offset && !s.is_empty())
        .or_else(|| spans.iter().rev().find(|s| s.end <= offset && !s.is_empty()))
        .map(|s| s.run);
    match neighbour.and_then(|run| tree.first_child_named(run, names::R_PR)) {
        Some(rpr) => Ok(Some(tree.deep_clone(rpr)?)),
        None => Ok(None),
    }
}

impl Container {
    /// Bookmarks whose start marker lies in one of the container's
    /// paragraphs, in document order
    pub fn bookmarks(&mut self, tree: &XmlTree) -> Vec<Bookmark> {
        let mut found = Vec::new();
        for paragraph in self.paragraphs(tree) {
            for marker in start_markers(tree, paragraph.node()) {
                let (Some(name), Some(id)) = (
                    tree.attribute(marker, names::ATTR_NAME),
                    tree.attribute(marker, names::ATTR_ID),
                ) else {
                    continue;
                };
                found.push(Bookmark {
                    name: name.to_string(),
                    id: id.to_string(),
                    start: marker,
                    paragraph: paragraph.clone(),
                });
            }
        }
        found
    }

    /// Find a bookmark by name
    pub fn bookmark(&mut self, tree: &XmlTree, name: &str) -> Option<Bookmark> {
        self.bookmarks(tree).into_iter().find(|b| same_name(&b.name, name))
    }

    /// Insert text right after the start marker of every bookmark called
    /// `name`, ahead of the bookmarked content. Returns false when no such
    /// bookmark exists.
    pub fn insert_at_bookmark(
        &mut self,
        tree: &mut XmlTree,
        content: &str,
        name: &str,
        formatting: Option<&Formatting>,
    ) -> Result<bool> {
        self.write_at_bookmark(tree, content, name, formatting, false)
    }

    /// Replace the bookmarked content of every bookmark called `name`,
    /// leaving both markers in place. Returns false when no such bookmark
    /// exists.
    pub fn replace_at_bookmark(
        &mut self,
        tree: &mut XmlTree,
        content: &str,
        name: &str,
        formatting: Option<&Formatting>,
    ) -> Result<bool> {
        self.write_at_bookmark(tree, content, name, formatting, true)
    }

    fn write_at_bookmark(
        &mut self,
        tree: &mut XmlTree,
        content: &str,
        name: &str,
        formatting: Option<&Formatting>,
        replace: bool,
    ) -> Result<bool> {
        check_name(name)?;
        let targets: Vec<Bookmark> = self
            .bookmarks(tree)
            .into_iter()
            .filter(|b| same_name(&b.name, name))
            .collect();

        for bookmark in &targets {
            let paragraph = bookmark.paragraph.node();
            let (start, end) = bookmark_range(tree, paragraph, bookmark.start, &bookmark.id);
            let properties = match formatting {
                None if !content.is_empty() => neighbour_properties(tree, paragraph, start)?,
                _ => None,
            };
            if replace && end > start {
                run_edit::remove_text(tree, paragraph, start, end - start, None)?;
            }
            if content.is_empty() {
                continue;
            }
            let run = match formatting {
                Some(formatting) => elements::run(tree, content, Some(formatting))?,
                None => elements::run_with_properties(tree, content, properties)?,
            };
            tree.insert_after(bookmark.start, run)?;
        }

        if !targets.is_empty() {
            debug!(bookmark = name, occurrences = targets.len(), replace, "wrote at bookmark");
            self.mark_paragraph_indexes_stale();
        }
        Ok(!targets.is_empty())
    }

    /// Delete the marker pair of every bookmark called `name`, keeping the
    /// bookmarked content
    pub fn remove_bookmark(&mut self, tree: &mut XmlTree, name: &str) -> Result<bool> {
        check_name(name)?;
        let targets: Vec<Bookmark> = self
            .bookmarks(tree)
            .into_iter()
            .filter(|b| same_name(&b.name, name))
            .collect();

        for bookmark in &targets {
            let scope = tree.ancestors(bookmark.start).last().unwrap_or(self.root());
            let end = tree
                .descendants_named(scope, names::BOOKMARK_END)
                .into_iter()
                .find(|end| tree.attribute(*end, names::ATTR_ID) == Some(bookmark.id.as_str()));
            tree.remove(bookmark.start)?;
            if let Some(end) = end {
                tree.remove(end)?;
            }
        }
        Ok(!targets.is_empty())
    }

    /// Names from `names` with no bookmark in the container; empty when
    /// every name exists
    pub fn validate_bookmarks(&mut self, tree: &XmlTree, names: &[&str]) -> Vec<String> {
        let existing: Vec<String> = self.bookmarks(tree).into_iter().map(|b| b.name).collect();
        names
            .iter()
            .filter(|name| !existing.iter().any(|e| same_name(e, name)))
            .map(|name| name.to_string())
            .collect()
    }

    /// Wrap a character range of a paragraph in a new bookmark
    pub fn insert_bookmark(
        &mut self,
        tree: &mut XmlTree,
        paragraph: &Paragraph,
        name: &str,
        start: usize,
        end: usize,
    ) -> Result<Bookmark> {
        check_name(name)?;
        let node = paragraph.node();
        let length = text::text_length(tree, node);
        if start > end || end > length {
            return Err(EditError::OutOfRange(format!(
                "bookmark range {}..{} outside paragraph of length {}",
                start, end, length
            )));
        }

        let scope = tree.ancestors(node).last().unwrap_or(node);
        let id = tree
            .descendants_named(scope, names::BOOKMARK_START)
            .into_iter()
            .filter_map(|m| tree.attribute(m, names::ATTR_ID)?.parse::<u32>().ok())
            .max()
            .map_or(0, |max| max + 1);
        let (start_marker, end_marker) = elements::bookmark_markers(tree, id, name);

        ensure_run_boundary(tree, node, start)?;
        ensure_run_boundary(tree, node, end)?;
        place_start_marker(tree, node, start, start_marker)?;
        if start == end {
            tree.insert_after(start_marker, end_marker)?;
        } else {
            place_end_marker(tree, node, end, end_marker)?;
        }
        self.mark_paragraph_indexes_stale();

        let paragraph = self.paragraph_for_node(tree, node)?;
        Ok(Bookmark {
            name: name.to_string(),
            id: id.to_string(),
            start: start_marker,
            paragraph,
        })
    }
}

/// Put a start marker before the content beginning at `offset`
fn place_start_marker(tree: &mut XmlTree, paragraph: NodeId, offset: usize, marker: NodeId) -> Result<()> {
    let spans = text::run_spans(tree, paragraph);
    let after = spans.iter().find(|s| s.start == offset && !s.is_empty());
    let before = spans.iter().rev().find(|s| s.end == offset && !s.is_empty());
    match (after, before) {
        (Some(after), _) => tree.insert_before(after.run, marker)?,
        (None, Some(before)) => tree.insert_after(before.run, marker)?,
        (None, None) => tree.append_child(paragraph, marker)?,
    }
    Ok(())
}

/// Put an end marker after the content ending at `offset`
fn place_end_marker(tree: &mut XmlTree, paragraph: NodeId, offset: usize, marker: NodeId) -> Result<()> {
    let spans = text::run_spans(tree, paragraph);
    let before = spans.iter().rev().find(|s| s.end == offset && !s.is_empty());
    let after = spans.iter().find(|s| s.start == offset && !s.is_empty());
    match (before, after) {
        (Some(before), _) => tree.insert_after(before.run, marker)?,
        (None, Some(after)) => tree.insert_before(after.run, marker)?,
        (None, None) => tree.append_child(paragraph, marker)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContainerKind;

    /// `Dear [name]Bob[/name], welcome` with the bookmark around "Bob"
    fn letter(tree: &mut XmlTree) -> (Container, NodeId) {
        let body = tree.create_element(names::BODY);
        let p = tree.create_element(names::P);
        let greeting = elements::run(tree, "Dear ", None).unwrap();
        let (start, end) = elements::bookmark_markers(tree, 0, "Recipient");
        let bold = Formatting::new().bold(true);
        let name = elements::run(tree, "Bob", Some(&bold)).unwrap();
        let tail = elements::run(tree, ", welcome", None).unwrap();
        for child in [greeting, start, name, end, tail] {
            tree.append_child(p, child).unwrap();
        }
        tree.append_child(body, p).unwrap();
        (Container::new(ContainerKind::Body, body), p)
    }

    #[test]
    fn test_list_bookmarks() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);

        let bookmarks = container.bookmarks(&tree);
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].name(), "Recipient");
        assert_eq!(bookmarks[0].paragraph().node(), p);
        assert_eq!(bookmarks[0].text(&tree), "Bob");
        assert!(container.bookmark(&tree, "recipient").is_some());
    }

    #[test]
    fn test_replace_keeps_markers() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);

        assert!(container.replace_at_bookmark(&mut tree, "Alice", "RECIPIENT", None).unwrap());

        assert_eq!(text::paragraph_text(&tree, p), "Dear Alice, welcome");
        let start = tree.first_child_named(p, names::BOOKMARK_START).unwrap();
        assert_eq!(tree.attribute(start, names::ATTR_NAME), Some("Recipient"));
        assert!(tree.first_child_named(p, names::BOOKMARK_END).is_some());
        assert_eq!(container.bookmark(&tree, "Recipient").unwrap().text(&tree), "Alice");
        // the new text takes the formatting of the content it replaced
        let run = tree.next_sibling(start).unwrap();
        assert_eq!(Formatting::of_run(&tree, run).bold, Some(true));
    }

    #[test]
    fn test_insert_keeps_existing_content() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);
        let italic = Formatting::new().italic(true);

        assert!(container.insert_at_bookmark(&mut tree, "Mr. ", "Recipient", Some(&italic)).unwrap());

        assert_eq!(text::paragraph_text(&tree, p), "Dear Mr. Bob, welcome");
        let start = tree.first_child_named(p, names::BOOKMARK_START).unwrap();
        let run = tree.next_sibling(start).unwrap();
        assert_eq!(Formatting::of_run(&tree, run), italic);
    }

    #[test]
    fn test_text_box_bookmarks_stay_with_the_text_box() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);
        let inner = tree.create_element(names::P);
        let (start, end) = elements::bookmark_markers(&mut tree, 1, "Box");
        let content = elements::run(&mut tree, "box", None).unwrap();
        for child in [start, content, end] {
            tree.append_child(inner, child).unwrap();
        }
        let text_box = tree.create_element(names::TXBX_CONTENT);
        tree.append_child(text_box, inner).unwrap();
        let drawing = tree.create_element(names::DRAWING);
        tree.append_child(drawing, text_box).unwrap();
        let anchor = tree.create_element(names::R);
        tree.append_child(anchor, drawing).unwrap();
        tree.append_child(p, anchor).unwrap();

        let listed: Vec<String> = container.bookmarks(&tree).into_iter().map(|b| b.name).collect();
        assert_eq!(listed, vec!["Recipient".to_string()]);
        assert!(!container.insert_at_bookmark(&mut tree, "X", "Box", None).unwrap());
        assert_eq!(text::paragraph_text(&tree, inner), "box");

        assert!(container.insert_at_bookmark(&mut tree, "X", "Recipient", None).unwrap());
        assert_eq!(text::paragraph_text(&tree, p), "Dear XBob, welcome");
    }

    #[test]
    fn test_missing_bookmark_is_not_an_error() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);

        assert!(!container.replace_at_bookmark(&mut tree, "x", "Nope", None).unwrap());
        assert!(!container.remove_bookmark(&mut tree, "Nope").unwrap());
        assert_eq!(text::paragraph_text(&tree, p), "Dear Bob, welcome");
        assert!(container.replace_at_bookmark(&mut tree, "x", "", None).is_err());
    }

    #[test]
    fn test_remove_bookmark_keeps_content() {
        let mut tree = XmlTree::new();
        let (mut container, p) = letter(&mut tree);

        assert!(container.remove_bookmark(&mut tree, "Recipient").unwrap());

        assert_eq!(text::paragraph_text(&tree, p), "Dear Bob, welcome");
        assert!(tree.descendants_named(p, names::BOOKMARK_START).is_empty());
        assert!(tree.descendants_named(p, names::BOOKMARK_END).is_empty());
    }

    #[test]
    fn test_validate_checks_each_name() {
        let mut tree = XmlTree::new();
        let (mut container, _) = letter(&mut tree);

        assert!(container.validate_bookmarks(&tree, &["Recipient"]).is_empty());
        assert_eq!(
            container.validate_bookmarks(&tree, &["recipient", "Sender", "Date"]),
            vec!["Sender".to_string(), "Date".to_string()]
        );
    }

    #[test]
    fn test_insert_bookmark_around_range() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        let paragraph = container.insert_paragraph(&mut tree, "Hello World", None).unwrap();

        let bookmark = container.insert_bookmark(&mut tree, &paragraph, "Target", 6, 11).unwrap();

        assert_eq!(bookmark.text(&tree), "World");
        assert_eq!(bookmark.id(), "0");
        container.replace_at_bookmark(&mut tree, "Mars", "Target", None).unwrap();
        assert_eq!(container.text(&tree), "Hello Mars");
        assert!(container.insert_bookmark(&mut tree, &paragraph, "Bad", 3, 40).is_err());
    }

    #[test]
    fn test_empty_bookmark_in_empty_paragraph() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        let paragraph = container.insert_paragraph(&mut tree, "", None).unwrap();
        container.insert_bookmark(&mut tree, &paragraph, "Slot", 0, 0).unwrap();

        container.replace_at_bookmark(&mut tree, "filled", "Slot", None).unwrap();

        assert_eq!(container.text(&tree), "filled");
        assert_eq!(container.bookmark(&tree, "Slot").unwrap().text(&tree), "filled");
    }
}
