//! Lists
//!
//! A list is a run of consecutive list-item paragraphs sharing one `numId`.
//! Lists built with [`List::new`] hold detached items; inserting a list into
//! a container places deep copies of them, so one list can be inserted
//! several times.

use crate::{Container, DocumentElement, EditError, Result};
use doc_model::{elements, names, Formatting, ListItemType, NodeId, NumberingReference, XmlTree};

const LIST_PARAGRAPH_STYLE: &str = "ListParagraph";
const MAX_LEVEL: u8 = 8;

/// Consecutive list-item paragraphs sharing a numbering definition
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    num_id: u32,
    item_type: ListItemType,
    items: Vec<NodeId>,
}

impl List {
    /// Create an empty list over an existing numbering definition
    pub fn new(num_id: u32, item_type: ListItemType) -> Self {
        Self {
            num_id,
            item_type,
            items: Vec::new(),
        }
    }

    pub fn num_id(&self) -> u32 {
        self.num_id
    }

    pub fn item_type(&self) -> ListItemType {
        self.item_type
    }

    /// Item paragraphs in order
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flattened text of every item
    pub fn item_texts(&self, tree: &XmlTree) -> Vec<String> {
        self.items
            .iter()
            .map(|item| doc_model::text::paragraph_text(tree, *item))
            .collect()
    }

    /// Add a detached item at an indentation level (0-8)
    pub fn add_item(
        &mut self,
        tree: &mut XmlTree,
        content: &str,
        level: u8,
        formatting: Option<&Formatting>,
    ) -> Result<NodeId> {
        if level > MAX_LEVEL {
            return Err(EditError::OutOfRange(format!(
                "list level {} outside 0..={}",
                level, MAX_LEVEL
            )));
        }
        let paragraph = elements::paragraph(tree, content, formatting)?;
        let ppr = tree.create_element(names::P_PR);
        let style = tree.create_element_with(names::P_STYLE, &[(names::ATTR_VAL, LIST_PARAGRAPH_STYLE)]);
        tree.append_child(ppr, style)?;
        tree.insert_child(paragraph, 0, ppr)?;
        NumberingReference {
            num_id: self.num_id,
            ilvl: level,
        }
        .apply(tree, paragraph)?;
        self.items.push(paragraph);
        Ok(paragraph)
    }

    fn copy_items(&self, tree: &mut XmlTree) -> Result<Vec<NodeId>> {
        if self.items.is_empty() {
            return Err(EditError::InvalidArgument("cannot insert an empty list".to_string()));
        }
        self.items
            .iter()
            .map(|item| tree.deep_clone(*item).map_err(EditError::from))
            .collect()
    }
}

impl From<&List> for DocumentElement {
    fn from(list: &List) -> Self {
        DocumentElement::List(list.items.clone())
    }
}

impl Container {
    /// Group consecutive list-item paragraphs sharing a `numId` into lists
    pub fn lists(&mut self, tree: &XmlTree) -> Vec<List> {
        let mut lists: Vec<List> = Vec::new();
        let mut previous_in_list = false;
        for paragraph in self.paragraphs(tree) {
            let Some(info) = paragraph.list_info() else {
                previous_in_list = false;
                continue;
            };
            match lists.last_mut() {
                Some(list) if previous_in_list && list.num_id == info.reference.num_id => {
                    list.items.push(paragraph.node());
                }
                _ => lists.push(List {
                    num_id: info.reference.num_id,
                    item_type: info.item_type,
                    items: vec![paragraph.node()],
                }),
            }
            previous_in_list = true;
        }
        lists
    }

    /// Append copies of a list's items; returns the inserted list
    pub fn insert_list(&mut self, tree: &mut XmlTree, list: &List) -> Result<List> {
        let items = list.copy_items(tree)?;
        for item in &items {
            self.append_block(tree, *item)?;
        }
        self.clear_paragraphs_cache();
        Ok(List { items, ..list.clone() })
    }

    /// Insert copies of a list's items at a logical offset, splitting the
    /// paragraph covering it
    pub fn insert_list_at(&mut self, tree: &mut XmlTree, index: usize, list: &List) -> Result<List> {
        self.check_insert_index(tree, index)?;
        let items = list.copy_items(tree)?;
        self.insert_blocks_at(tree, index, &items)?;
        Ok(List { items, ..list.clone() })
    }
}
