//! Footnotes and endnotes
//!
//! Both note kinds share one implementation; `NoteKind` carries the names
//! that differ. Notes live in their own part (`w:footnotes`/`w:endnotes`),
//! each `w:footnote`/`w:endnote` being a paragraph container referenced from
//! a run in the body by its `w:id`.

use crate::{Container, ContainerKind, EditError, Paragraph, Result};
use doc_model::{elements, names, NodeId, XmlTree};
use serde::{Deserialize, Serialize};
use store::docx::{content_type_values, relationship_types, template};

/// Footnote or endnote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Footnote,
    Endnote,
}

impl NoteKind {
    /// Root element of the notes part
    pub fn root_name(&self) -> &'static str {
        match self {
            NoteKind::Footnote => names::FOOTNOTES,
            NoteKind::Endnote => names::ENDNOTES,
        }
    }

    /// Element of one note
    pub fn note_name(&self) -> &'static str {
        match self {
            NoteKind::Footnote => names::FOOTNOTE,
            NoteKind::Endnote => names::ENDNOTE,
        }
    }

    /// Reference element placed in the body
    pub fn reference_name(&self) -> &'static str {
        match self {
            NoteKind::Footnote => names::FOOTNOTE_REFERENCE,
            NoteKind::Endnote => names::ENDNOTE_REFERENCE,
        }
    }

    /// Number mark repeated at the start of the note
    pub fn mark_name(&self) -> &'static str {
        match self {
            NoteKind::Footnote => names::FOOTNOTE_REF,
            NoteKind::Endnote => names::ENDNOTE_REF,
        }
    }

    fn text_style(&self) -> &'static str {
        match self {
            NoteKind::Footnote => "FootnoteText",
            NoteKind::Endnote => "EndnoteText",
        }
    }

    fn reference_style(&self) -> &'static str {
        match self {
            NoteKind::Footnote => "FootnoteReference",
            NoteKind::Endnote => "EndnoteReference",
        }
    }

    pub fn part_name(&self) -> &'static str {
        match self {
            NoteKind::Footnote => "word/footnotes.xml",
            NoteKind::Endnote => "word/endnotes.xml",
        }
    }

    pub fn relationship_type(&self) -> &'static str {
        match self {
            NoteKind::Footnote => relationship_types::FOOTNOTES,
            NoteKind::Endnote => relationship_types::ENDNOTES,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            NoteKind::Footnote => content_type_values::FOOTNOTES,
            NoteKind::Endnote => content_type_values::ENDNOTES,
        }
    }

    /// Markup of a new notes part with its separator notes
    pub fn template(&self) -> &'static str {
        match self {
            NoteKind::Footnote => template::FOOTNOTES_XML,
            NoteKind::Endnote => template::ENDNOTES_XML,
        }
    }

    pub fn container_kind(&self) -> ContainerKind {
        match self {
            NoteKind::Footnote => ContainerKind::Footnote,
            NoteKind::Endnote => ContainerKind::Endnote,
        }
    }
}

/// One footnote or endnote
#[derive(Debug, Clone)]
pub struct Note {
    kind: NoteKind,
    id: i64,
    container: Container,
}

impl Note {
    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    /// `w:id` shared by the note and its reference
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.container.root()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn text(&mut self, tree: &XmlTree) -> String {
        self.container.text(tree)
    }
}

fn is_separator(tree: &XmlTree, note: NodeId) -> bool {
    matches!(
        tree.attribute(note, names::ATTR_TYPE),
        Some("separator") | Some("continuationSeparator") | Some("continuationNotice")
    )
}

fn note_id(tree: &XmlTree, note: NodeId) -> Option<i64> {
    tree.attribute(note, names::ATTR_ID)?.parse().ok()
}

/// Regular notes of a notes part, separator notes excluded
pub fn notes(tree: &XmlTree, kind: NoteKind, part_root: NodeId, author: &str) -> Vec<Note> {
    tree.children_named(part_root, kind.note_name())
        .into_iter()
        .filter(|note| !is_separator(tree, *note))
        .filter_map(|note| {
            Some(Note {
                kind,
                id: note_id(tree, note)?,
                container: Container::new(kind.container_kind(), note).with_revision_author(author),
            })
        })
        .collect()
}

/// Append a note holding `content` to a notes part and a reference to it at
/// the end of `paragraph`
pub fn insert_note(
    tree: &mut XmlTree,
    kind: NoteKind,
    part_root: NodeId,
    paragraph: &Paragraph,
    content: &str,
    author: &str,
) -> Result<Note> {
    if !tree.is(part_root, kind.root_name()) {
        return Err(EditError::InvalidArgument(format!(
            "expected a {} part root",
            kind.root_name()
        )));
    }
    let id = tree
        .children_named(part_root, kind.note_name())
        .into_iter()
        .filter_map(|note| note_id(tree, note))
        .max()
        .map_or(1, |max| (max + 1).max(1));
    let id_text = id.to_string();

    // the note: styled paragraph opening with the number mark
    let note = tree.create_element_with(kind.note_name(), &[(names::ATTR_ID, id_text.as_str())]);
    let p = elements::paragraph(tree, "", None)?;
    let ppr = tree.create_element(names::P_PR);
    let style = tree.create_element_with(names::P_STYLE, &[(names::ATTR_VAL, kind.text_style())]);
    tree.append_child(ppr, style)?;
    tree.append_child(p, ppr)?;
    let mark_run = styled_run(tree, kind.reference_style())?;
    let mark = tree.create_element(kind.mark_name());
    tree.append_child(mark_run, mark)?;
    tree.append_child(p, mark_run)?;
    let text_run = elements::run(tree, content, None)?;
    tree.append_child(p, text_run)?;
    tree.append_child(note, p)?;
    tree.append_child(part_root, note)?;

    // the reference in the body
    let reference_run = styled_run(tree, kind.reference_style())?;
    let reference = tree.create_element_with(kind.reference_name(), &[(names::ATTR_ID, id_text.as_str())]);
    tree.append_child(reference_run, reference)?;
    tree.append_child(paragraph.node(), reference_run)?;

    Ok(Note {
        kind,
        id,
        container: Container::new(kind.container_kind(), note).with_revision_author(author),
    })
}

fn styled_run(tree: &mut XmlTree, style: &str) -> Result<NodeId> {
    let run = tree.create_element(names::R);
    let rpr = tree.create_element(names::R_PR);
    let r_style = tree.create_element_with(names::R_STYLE, &[(names::ATTR_VAL, style)]);
    tree.append_child(rpr, r_style)?;
    tree.append_child(run, rpr)?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::docx::xml_io;

    fn notes_part(tree: &mut XmlTree, kind: NoteKind) -> NodeId {
        xml_io::parse_part(tree, kind.template().as_bytes()).unwrap()
    }

    #[test]
    fn test_separators_are_not_notes() {
        let mut tree = XmlTree::new();
        let root = notes_part(&mut tree, NoteKind::Footnote);
        assert!(notes(&tree, NoteKind::Footnote, root, "Author").is_empty());
    }

    #[test]
    fn test_insert_footnote() {
        let mut tree = XmlTree::new();
        let root = notes_part(&mut tree, NoteKind::Footnote);
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        let paragraph = container.insert_paragraph(&mut tree, "Claim", None).unwrap();

        let mut note = insert_note(&mut tree, NoteKind::Footnote, root, &paragraph, "Source", "Author").unwrap();

        assert_eq!(note.id(), 1);
        assert_eq!(note.text(&tree), "Source");
        assert_eq!(note.container().kind(), ContainerKind::Footnote);
        // the reference run adds no text to the body paragraph
        assert_eq!(container.text(&tree), "Claim");
        let reference = tree.descendants_named(paragraph.node(), names::FOOTNOTE_REFERENCE);
        assert_eq!(tree.attribute(reference[0], names::ATTR_ID), Some("1"));

        let second = insert_note(&mut tree, NoteKind::Footnote, root, &paragraph, "Another", "Author").unwrap();
        assert_eq!(second.id(), 2);
        let listed = notes(&tree, NoteKind::Footnote, root, "Author");
        assert_eq!(listed.iter().map(Note::id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_note_kind_mismatch() {
        let mut tree = XmlTree::new();
        let root = notes_part(&mut tree, NoteKind::Endnote);
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        let paragraph = container.insert_paragraph(&mut tree, "x", None).unwrap();

        assert!(insert_note(&mut tree, NoteKind::Footnote, root, &paragraph, "n", "Author").is_err());
        let endnote = insert_note(&mut tree, NoteKind::Endnote, root, &paragraph, "n", "Author").unwrap();
        assert_eq!(endnote.container().kind(), ContainerKind::Endnote);
    }
}
