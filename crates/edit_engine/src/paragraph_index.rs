//! Paragraph index
//!
//! Walks every `w:p` under a scope in document order (pre-order, left to
//! right), skipping compatibility fallbacks and text-box content, and
//! assigns each paragraph a
//! contiguous `[start_index, end_index]` range. A paragraph occupies
//! `max(1, text length)` offsets so an empty paragraph stays addressable.

use crate::{ContainerKind, ListInfo, Paragraph};
use doc_model::{names, numbering, text, NodeId, NumberingReference, XmlTree};

/// All paragraphs under `root` in document order
pub fn paragraph_nodes(tree: &XmlTree, root: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    collect(tree, root, &mut result);
    result
}

fn collect(tree: &XmlTree, node: NodeId, out: &mut Vec<NodeId>) {
    for child in tree.child_elements(node) {
        if tree.is(child, names::MC_FALLBACK) || tree.is(child, names::TXBX_CONTENT) {
            continue;
        }
        if tree.is(child, names::P) {
            out.push(child);
        }
        collect(tree, child, out);
    }
}

/// Inclusive offset ranges of consecutive paragraphs, starting at 0
pub fn compute_offsets(tree: &XmlTree, nodes: &[NodeId]) -> Vec<(usize, usize)> {
    let mut running = 0;
    nodes
        .iter()
        .map(|node| {
            let start = running;
            running += text::text_length(tree, *node).max(1);
            (start, running - 1)
        })
        .collect()
}

/// Build the bare index of a scope: nodes and offsets, no enrichment
pub fn build_index(tree: &XmlTree, root: NodeId, kind: ContainerKind) -> Vec<Paragraph> {
    let nodes = paragraph_nodes(tree, root);
    let offsets = compute_offsets(tree, &nodes);
    let generation = tree.content_generation();
    nodes
        .into_iter()
        .zip(offsets)
        .map(|(node, (start, end))| Paragraph::new(node, start, end, kind, generation))
        .collect()
}

/// Resolve parent kind, following tables and list membership
pub(crate) fn enrich(tree: &XmlTree, paragraphs: &mut [Paragraph], default_kind: ContainerKind) {
    let numbering_root = tree.part_with_root(names::NUMBERING).map(|(_, root)| root);
    for paragraph in paragraphs.iter_mut() {
        let node = paragraph.node();
        paragraph.parent_container = parent_container_kind(tree, node, default_kind);
        paragraph.following_tables = following_tables(tree, node);
        paragraph.list = NumberingReference::of_paragraph(tree, node).map(|reference| ListInfo {
            reference,
            item_type: numbering::list_item_type(tree, numbering_root, reference.num_id, reference.ilvl),
        });
    }
}

/// Kind of the nearest structural ancestor of a paragraph
pub fn parent_container_kind(tree: &XmlTree, node: NodeId, default_kind: ContainerKind) -> ContainerKind {
    for ancestor in tree.ancestors(node) {
        let kind = match tree.name(ancestor) {
            Some(names::TC) => ContainerKind::Cell,
            Some(names::SDT) if is_table_of_contents(tree, ancestor) => ContainerKind::Toc,
            Some(names::HDR) => ContainerKind::Header,
            Some(names::FTR) => ContainerKind::Footer,
            Some(names::FOOTNOTE) => ContainerKind::Footnote,
            Some(names::ENDNOTE) => ContainerKind::Endnote,
            Some(names::BODY) => ContainerKind::Body,
            _ => continue,
        };
        return kind;
    }
    default_kind
}

fn is_table_of_contents(tree: &XmlTree, sdt: NodeId) -> bool {
    tree.first_child_named(sdt, names::SDT_PR)
        .and_then(|pr| tree.first_child_named(pr, names::DOC_PART_OBJ))
        .and_then(|obj| tree.first_child_named(obj, names::DOC_PART_GALLERY))
        .and_then(|gallery| tree.attribute(gallery, names::ATTR_VAL))
        .is_some_and(|val| val == "Table of Contents")
}

/// Consecutive `w:tbl` siblings directly after a paragraph
pub fn following_tables(tree: &XmlTree, node: NodeId) -> Vec<NodeId> {
    let mut tables = Vec::new();
    let mut current = tree.next_sibling(node);
    while let Some(sibling) = current {
        if !tree.is(sibling, names::TBL) {
            break;
        }
        tables.push(sibling);
        current = tree.next_sibling(sibling);
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::elements;

    fn body_with(tree: &mut XmlTree, texts: &[&str]) -> NodeId {
        let body = tree.create_element(names::BODY);
        for text in texts {
            let p = elements::paragraph(tree, text, None).unwrap();
            tree.append_child(body, p).unwrap();
        }
        body
    }

    #[test]
    fn test_scenario_offsets() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["Hello ", "World", ""]);

        let index = build_index(&tree, body, ContainerKind::Body);
        let ranges: Vec<_> = index.iter().map(|p| (p.start_index, p.end_index)).collect();
        assert_eq!(ranges, vec![(0, 5), (6, 10), (11, 11)]);
    }

    #[test]
    fn test_empty_scope() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        assert!(build_index(&tree, body, ContainerKind::Body).is_empty());
    }

    #[test]
    fn test_fallback_paragraphs_skipped() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["visible"]);
        let alternate = tree.create_element(names::MC_ALTERNATE_CONTENT);
        let fallback = tree.create_element(names::MC_FALLBACK);
        let hidden = elements::paragraph(&mut tree, "hidden", None).unwrap();
        tree.append_child(fallback, hidden).unwrap();
        tree.append_child(alternate, fallback).unwrap();
        tree.append_child(body, alternate).unwrap();

        let nodes = paragraph_nodes(&tree, body);
        assert_eq!(nodes.len(), 1);
    }

    /// A run anchoring a text box whose only paragraph holds `content`
    fn text_box_run(tree: &mut XmlTree, content: &str) -> NodeId {
        let run = tree.create_element(names::R);
        let drawing = tree.create_element(names::DRAWING);
        let shape_text = tree.create_element("wps:txbx");
        let text_box = tree.create_element(names::TXBX_CONTENT);
        let inner = elements::paragraph(tree, content, None).unwrap();
        tree.append_child(text_box, inner).unwrap();
        tree.append_child(shape_text, text_box).unwrap();
        tree.append_child(drawing, shape_text).unwrap();
        tree.append_child(run, drawing).unwrap();
        run
    }

    #[test]
    fn test_text_box_paragraphs_skipped() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["abcd"]);
        let outer = tree.children(body)[0];
        let anchor = text_box_run(&mut tree, "cat");
        tree.append_child(outer, anchor).unwrap();

        let index = build_index(&tree, body, ContainerKind::Body);

        assert_eq!(index.len(), 1);
        assert_eq!(index[0].node(), outer);
        assert_eq!((index[0].start_index, index[0].end_index), (0, 3));
    }

    #[test]
    fn test_choice_paragraphs_indexed() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["first"]);
        let alternate = tree.create_element(names::MC_ALTERNATE_CONTENT);
        let choice = tree.create_element(names::MC_CHOICE);
        let fallback = tree.create_element(names::MC_FALLBACK);
        let modern = elements::paragraph(&mut tree, "modern", None).unwrap();
        let legacy = elements::paragraph(&mut tree, "legacy", None).unwrap();
        tree.append_child(choice, modern).unwrap();
        tree.append_child(fallback, legacy).unwrap();
        tree.append_child(alternate, choice).unwrap();
        tree.append_child(alternate, fallback).unwrap();
        tree.append_child(body, alternate).unwrap();

        let nodes = paragraph_nodes(&tree, body);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], modern);
    }

    #[test]
    fn test_table_cells_in_document_order() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["before"]);
        let table = elements::table(&mut tree, 1, 2).unwrap();
        tree.append_child(body, table).unwrap();
        let after = elements::paragraph(&mut tree, "after", None).unwrap();
        tree.append_child(body, after).unwrap();

        let mut index = build_index(&tree, body, ContainerKind::Body);
        enrich(&tree, &mut index, ContainerKind::Body);

        assert_eq!(index.len(), 4);
        assert_eq!(index[0].following_tables(), &[table]);
        assert_eq!(index[1].parent_container(), ContainerKind::Cell);
        assert_eq!(index[2].parent_container(), ContainerKind::Cell);
        assert_eq!(index[3].parent_container(), ContainerKind::Body);
        assert_eq!(index[3].node(), after);
    }

    #[test]
    fn test_list_membership() {
        let mut tree = XmlTree::new();
        let body = body_with(&mut tree, &["item"]);
        let p = tree.children(body)[0];
        NumberingReference { num_id: 4, ilvl: 1 }.apply(&mut tree, p).unwrap();

        let mut index = build_index(&tree, body, ContainerKind::Body);
        enrich(&tree, &mut index, ContainerKind::Body);

        let info = index[0].list_info().unwrap();
        assert_eq!(info.reference.num_id, 4);
        assert_eq!(info.item_type, doc_model::ListItemType::Numbered);
    }
}
