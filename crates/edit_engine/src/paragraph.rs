//! Paragraph wrapper
//!
//! A `Paragraph` is a handle on a `w:p` element in the arena together with the
//! logical offsets it was indexed at. Offsets are only valid for the content
//! generation they were computed against; `is_stale` reports when the tree has
//! moved on since.

use doc_model::{text, ListItemType, NodeId, NumberingReference, XmlTree};
use serde::{Deserialize, Serialize};

/// Kind of structural scope a paragraph or container belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Body,
    Header,
    Footer,
    Table,
    Cell,
    Section,
    Toc,
    Footnote,
    Endnote,
}

/// List membership of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInfo {
    pub reference: NumberingReference,
    pub item_type: ListItemType,
}

/// One block-level text unit
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    node: NodeId,
    /// First logical offset covered by the paragraph
    pub start_index: usize,
    /// Last logical offset covered by the paragraph (inclusive)
    pub end_index: usize,
    pub(crate) parent_container: ContainerKind,
    pub(crate) following_tables: Vec<NodeId>,
    pub(crate) list: Option<ListInfo>,
    pub(crate) generation: u64,
}

impl Paragraph {
    pub(crate) fn new(node: NodeId, start_index: usize, end_index: usize, kind: ContainerKind, generation: u64) -> Self {
        Self {
            node,
            start_index,
            end_index,
            parent_container: kind,
            following_tables: Vec::new(),
            list: None,
            generation,
        }
    }

    /// The underlying `w:p` element
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Scope the paragraph was found in
    pub fn parent_container(&self) -> ContainerKind {
        self.parent_container
    }

    /// Tables directly following this paragraph
    pub fn following_tables(&self) -> &[NodeId] {
        &self.following_tables
    }

    /// List membership, None for plain paragraphs
    pub fn list_info(&self) -> Option<ListInfo> {
        self.list
    }

    pub fn is_list_item(&self) -> bool {
        self.list.is_some()
    }

    /// Content generation the offsets were computed at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check whether the node is gone or the offsets predate a later mutation
    pub fn is_stale(&self, tree: &XmlTree) -> bool {
        !tree.contains(self.node) || self.generation != tree.content_generation()
    }

    /// Number of logical offsets the paragraph occupies (at least one)
    pub fn slot_len(&self) -> usize {
        self.end_index + 1 - self.start_index
    }

    /// Flattened text, read live from the tree
    pub fn text(&self, tree: &XmlTree) -> String {
        text::paragraph_text(tree, self.node)
    }

    /// Character length of the flattened text, read live from the tree
    pub fn text_length(&self, tree: &XmlTree) -> usize {
        text::text_length(tree, self.node)
    }

    /// Check whether a logical offset falls inside the paragraph
    pub fn covers(&self, index: usize) -> bool {
        self.start_index <= index && index <= self.end_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::elements;

    #[test]
    fn test_paragraph_goes_stale_after_mutation() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "Hello", None).unwrap();
        let paragraph = Paragraph::new(p, 0, 4, ContainerKind::Body, tree.content_generation());

        assert!(!paragraph.is_stale(&tree));
        assert_eq!(paragraph.slot_len(), 5);
        assert!(paragraph.covers(4));
        assert!(!paragraph.covers(5));

        tree.set_attribute(p, "w:rsidR", "00A1").unwrap();
        assert!(paragraph.is_stale(&tree));
        assert_eq!(paragraph.text(&tree), "Hello");
    }

    #[test]
    fn test_list_info_serializes_by_field() {
        let info = ListInfo {
            reference: NumberingReference { num_id: 3, ilvl: 1 },
            item_type: ListItemType::Bulleted,
        };

        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["reference"]["num_id"], 3);
        assert_eq!(json["item_type"], "Bulleted");
        assert_eq!(serde_json::to_string(&ContainerKind::Footnote).unwrap(), "\"Footnote\"");
    }
}
