//! Arena-backed XML tree shared by every loaded package part
//!
//! Wrappers (paragraphs, tables, cells, containers) hold `NodeId`s into this
//! arena instead of references, so structural edits never leave a wrapper
//! pointing into freed memory: a removed node simply stops resolving.
//!
//! The arena keeps two generation counters:
//! - `block_generation` moves whenever a subtree containing a paragraph or a
//!   table is attached or detached, i.e. whenever the set or order of
//!   paragraphs may have changed.
//! - `content_generation` moves on every mutation, including text edits that
//!   only shift logical offsets.

use crate::{names, DocModelError, NodeId, Result};
use std::collections::{BTreeMap, HashMap};

/// A single attribute on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name (e.g. `w:val`)
    pub name: String,
    /// Unescaped attribute value
    pub value: String,
}

/// Payload of an arena node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNodeKind {
    /// Element with a qualified name and ordered attributes
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// Character data
    Text(String),
}

/// A node stored in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    id: NodeId,
    kind: XmlNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl XmlNode {
    /// Get the node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node payload
    pub fn kind(&self) -> &XmlNodeKind {
        &self.kind
    }

    /// Get the parent node id (None for part roots and detached nodes)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Get the ordered child ids
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The arena holding all parts of a package
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    nodes: HashMap<NodeId, XmlNode>,
    parts: BTreeMap<String, NodeId>,
    block_generation: u64,
    content_generation: u64,
}

impl XmlTree {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.insert_node(XmlNodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached element with attributes
    pub fn create_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.insert_node(XmlNodeKind::Element {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(name, value)| Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert_node(XmlNodeKind::Text(text.to_string()))
    }

    fn insert_node(&mut self, kind: XmlNodeKind) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id,
            XmlNode {
                id,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check whether a node exists in the arena
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(&id)
    }

    fn node_ref(&self, id: NodeId) -> Result<&XmlNode> {
        self.nodes.get(&id).ok_or(DocModelError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut XmlNode> {
        self.nodes.get_mut(&id).ok_or(DocModelError::NodeNotFound(id))
    }

    /// Number of nodes currently in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Qualified element name, None for text nodes and unknown ids
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(&id)?.kind {
            XmlNodeKind::Element { name, .. } => Some(name),
            XmlNodeKind::Text(_) => None,
        }
    }

    /// Local element name (`w:p` → `p`)
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(names::local_name)
    }

    /// Check whether a node is an element with the given qualified name
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Check whether a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.name(id).is_some()
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(&id)?.kind {
            XmlNodeKind::Text(text) => Some(text),
            XmlNodeKind::Element { .. } => None,
        }
    }

    /// Attributes of an element (empty for text nodes)
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(XmlNodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    /// Children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children of a node
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(move |c| self.is_element(*c))
    }

    /// First child element with the given name
    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|c| self.is(*c, name))
    }

    /// All child elements with the given name
    pub fn children_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is(*c, name))
            .collect()
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Previous sibling of a node
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.children(parent).get(i).copied())
    }

    /// Ancestors of a node, nearest first (the node itself excluded)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Nearest ancestor with the given name
    pub fn ancestor_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.is(*a, name))
    }

    /// Check whether `id` lies in the subtree rooted at `ancestor`
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Pre-order descendants of a node (the node itself excluded)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Pre-order descendant elements with the given name
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.is(*d, name))
            .collect()
    }

    /// Concatenated character data of all descendant text nodes
    pub fn inner_text(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set (or add) an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            XmlNodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|a| a.name == name) {
                    Some(existing) => existing.value = value.to_string(),
                    None => attributes.push(Attribute {
                        name: name.to_string(),
                        value: value.to_string(),
                    }),
                }
            }
            XmlNodeKind::Text(_) => return Err(DocModelError::NotAnElement(id)),
        }
        self.content_generation += 1;
        Ok(())
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let node = self.node_mut(id)?;
        let removed = match &mut node.kind {
            XmlNodeKind::Element { attributes, .. } => attributes
                .iter()
                .position(|a| a.name == name)
                .map(|pos| attributes.remove(pos).value),
            XmlNodeKind::Text(_) => return Err(DocModelError::NotAnElement(id)),
        };
        if removed.is_some() {
            self.content_generation += 1;
        }
        Ok(removed)
    }

    /// Rename an element
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            XmlNodeKind::Element { name, .. } => *name = new_name.to_string(),
            XmlNodeKind::Text(_) => return Err(DocModelError::NotAnElement(id)),
        }
        self.content_generation += 1;
        Ok(())
    }

    /// Replace the content of an element with a single text node
    pub fn set_element_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        if !self.is_element(id) {
            return Err(DocModelError::NotAnElement(id));
        }
        for child in self.children(id).to_vec() {
            self.remove(child)?;
        }
        let text_node = self.create_text(text);
        self.append_child(id, text_node)
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert a detached node at `index` among the children of `parent`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        let parent_node = self.node_mut(parent)?;
        if index > parent_node.children.len() {
            return Err(DocModelError::TreeStructureError(format!(
                "child index {} out of bounds ({} children)",
                index,
                parent_node.children.len()
            )));
        }
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.touch(child);
        Ok(())
    }

    /// Insert a detached node directly before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> Result<()> {
        let (parent, index) = self.position_of(sibling)?;
        self.insert_child(parent, index, node)
    }

    /// Insert a detached node directly after `sibling`
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) -> Result<()> {
        let (parent, index) = self.position_of(sibling)?;
        self.insert_child(parent, index + 1, node)
    }

    /// Detach a node from its parent, keeping its subtree in the arena
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node_ref(id)?.parent;
        if let Some(parent) = parent {
            self.touch(id);
            self.node_mut(parent)?.children.retain(|c| *c != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Detach a node and drop its whole subtree from the arena
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            self.nodes.remove(&node);
        }
        self.parts.retain(|_, root| *root != id);
        Ok(())
    }

    /// Replace `old` by a sequence of detached nodes, then drop `old`
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<()> {
        let (parent, index) = self.position_of(old)?;
        for (offset, node) in replacements.iter().enumerate() {
            self.insert_child(parent, index + offset, *node)?;
        }
        self.remove(old)
    }

    /// Move all children of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for child in self.children(from).to_vec() {
            self.detach(child)?;
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Copy an element (name and attributes only) into a new detached node
    pub fn shallow_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let kind = self.node_ref(id)?.kind.clone();
        Ok(self.insert_node(kind))
    }

    /// Copy a whole subtree into a new detached subtree with fresh ids
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let copy = self.shallow_clone(id)?;
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_clone(child)?;
            self.node_mut(child_copy)?.parent = Some(copy);
            self.node_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    fn position_of(&self, id: NodeId) -> Result<(NodeId, usize)> {
        let parent = self.node_ref(id)?.parent.ok_or_else(|| {
            DocModelError::TreeStructureError(format!("node {} has no parent", id))
        })?;
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == id)
            .ok_or_else(|| DocModelError::TreeStructureError(format!("node {} not among its parent's children", id)))?;
        Ok((parent, index))
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.is_element(self.node_ref(parent)?.id) {
            return Err(DocModelError::NotAnElement(parent));
        }
        if self.node_ref(child)?.parent.is_some() {
            return Err(DocModelError::AlreadyAttached(child));
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(DocModelError::TreeStructureError(format!(
                "attaching {} under {} would create a cycle",
                child, parent
            )));
        }
        Ok(())
    }

    fn touch(&mut self, subtree: NodeId) {
        self.content_generation += 1;
        if self.contains_block(subtree) {
            self.block_generation += 1;
        }
    }

    fn contains_block(&self, id: NodeId) -> bool {
        let is_block = |n: NodeId| self.is(n, names::P) || self.is(n, names::TBL);
        is_block(id) || self.descendants(id).into_iter().any(is_block)
    }

    // =========================================================================
    // Generations
    // =========================================================================

    /// Generation of the paragraph/table structure
    pub fn block_generation(&self) -> u64 {
        self.block_generation
    }

    /// Generation of any content
    pub fn content_generation(&self) -> u64 {
        self.content_generation
    }

    // =========================================================================
    // Part roots
    // =========================================================================

    /// Register the root element of a package part
    pub fn set_part_root(&mut self, part_name: &str, root: NodeId) {
        self.parts.insert(part_name.to_string(), root);
        self.block_generation += 1;
        self.content_generation += 1;
    }

    /// Root element of a package part
    pub fn part_root(&self, part_name: &str) -> Option<NodeId> {
        self.parts.get(part_name).copied()
    }

    /// All registered parts
    pub fn parts(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.parts.iter().map(|(name, root)| (name.as_str(), *root))
    }

    /// First part whose root element has the given name
    pub fn part_with_root(&self, root_name: &str) -> Option<(&str, NodeId)> {
        self.parts().find(|(_, root)| self.is(*root, root_name))
    }

    /// Part whose root is an ancestor-or-self of `id`
    pub fn part_of(&self, id: NodeId) -> Option<&str> {
        let top = self.ancestors(id).last().unwrap_or(id);
        self.parts
            .iter()
            .find(|(_, root)| **root == top)
            .map(|(name, _)| name.as_str())
    }
}

/// Iterator over the ancestors of a node
pub struct Ancestors<'a> {
    tree: &'a XmlTree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph_with_text(tree: &mut XmlTree, text: &str) -> NodeId {
        let p = tree.create_element(names::P);
        let r = tree.create_element(names::R);
        let t = tree.create_element(names::T);
        tree.set_element_text(t, text).unwrap();
        tree.append_child(r, t).unwrap();
        tree.append_child(p, r).unwrap();
        p
    }

    #[test]
    fn test_append_and_query() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = paragraph_with_text(&mut tree, "Hello");
        tree.append_child(body, p).unwrap();

        assert_eq!(tree.children(body), &[p]);
        assert_eq!(tree.parent(p), Some(body));
        assert_eq!(tree.inner_text(p), "Hello");
        assert_eq!(tree.local_name(p), Some("p"));
        assert_eq!(tree.descendants_named(body, names::T).len(), 1);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let middle = tree.create_element(names::P);
        tree.append_child(body, middle).unwrap();
        let first = tree.create_element(names::P);
        let last = tree.create_element(names::P);
        tree.insert_before(middle, first).unwrap();
        tree.insert_after(middle, last).unwrap();

        assert_eq!(tree.children(body), &[first, middle, last]);
        assert_eq!(tree.next_sibling(first), Some(middle));
        assert_eq!(tree.previous_sibling(first), None);
        assert_eq!(tree.previous_sibling(last), Some(middle));
    }

    #[test]
    fn test_attach_rejects_attached_and_cycles() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = tree.create_element(names::P);
        tree.append_child(body, p).unwrap();

        assert!(matches!(tree.append_child(body, p), Err(DocModelError::AlreadyAttached(_))));

        tree.detach(body).unwrap();
        assert!(tree.append_child(p, body).is_err());
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = paragraph_with_text(&mut tree, "gone");
        tree.append_child(body, p).unwrap();
        let before = tree.len();

        tree.remove(p).unwrap();
        assert!(!tree.contains(p));
        assert_eq!(tree.len(), before - 4);
        assert!(tree.children(body).is_empty());
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = paragraph_with_text(&mut tree, "copy me");
        tree.append_child(body, p).unwrap();
        tree.set_attribute(p, names::ATTR_PARA_ID, "1234").unwrap();

        let copy = tree.deep_clone(p).unwrap();
        assert_ne!(copy, p);
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.inner_text(copy), "copy me");
        assert_eq!(tree.attribute(copy, names::ATTR_PARA_ID), Some("1234"));
    }

    #[test]
    fn test_generations_track_block_changes() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = paragraph_with_text(&mut tree, "text");
        let block = tree.block_generation();

        tree.append_child(body, p).unwrap();
        assert!(tree.block_generation() > block);

        let block = tree.block_generation();
        let content = tree.content_generation();
        let t = tree.descendants_named(p, names::T)[0];
        tree.set_element_text(t, "changed").unwrap();
        assert_eq!(tree.block_generation(), block);
        assert!(tree.content_generation() > content);
    }

    #[test]
    fn test_replace_with_sequence() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let p = tree.create_element(names::P);
        tree.append_child(body, p).unwrap();
        let a = tree.create_element(names::P);
        let b = tree.create_element(names::TBL);

        tree.replace_with(p, &[a, b]).unwrap();
        assert_eq!(tree.children(body), &[a, b]);
        assert!(!tree.contains(p));
    }

    #[test]
    fn test_part_lookup() {
        let mut tree = XmlTree::new();
        let document = tree.create_element(names::DOCUMENT);
        let body = tree.create_element(names::BODY);
        tree.append_child(document, body).unwrap();
        tree.set_part_root("word/document.xml", document);

        assert_eq!(tree.part_root("word/document.xml"), Some(document));
        assert_eq!(tree.part_of(body), Some("word/document.xml"));
        assert_eq!(tree.part_with_root(names::DOCUMENT).map(|(n, _)| n), Some("word/document.xml"));
    }
}
