//! Paragraph splitting
//!
//! Cutting a paragraph at a character offset produces two detached
//! paragraphs whose texts concatenate to the original. A run straddling the
//! cut is duplicated with its `w:rPr`, run containers (hyperlinks, content
//! controls, insertions) are split recursively, and zero-length markers stay
//! on the side of the cut they were on. Paragraph properties go to both
//! halves except an embedded `w:sectPr`, which only the second half keeps.

use crate::{EditError, Result};
use doc_model::{elements, names, text, NodeId, XmlTree};

/// The two halves of a split paragraph, both detached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphSplit {
    pub before: NodeId,
    pub after: NodeId,
}

/// Split a paragraph at `offset` (`0..=length`). The source paragraph is
/// left untouched.
pub fn split_paragraph(tree: &mut XmlTree, paragraph: NodeId, offset: usize) -> Result<ParagraphSplit> {
    let length = text::text_length(tree, paragraph);
    if offset > length {
        return Err(EditError::OutOfRange(format!(
            "split offset {} beyond paragraph length {}",
            offset, length
        )));
    }

    let before = tree.shallow_clone(paragraph)?;
    let after = tree.shallow_clone(paragraph)?;
    // the original ids stay with the first half
    tree.remove_attribute(after, names::ATTR_PARA_ID)?;
    tree.remove_attribute(after, names::ATTR_TEXT_ID)?;

    distribute(tree, paragraph, before, after, offset)?;
    Ok(ParagraphSplit { before, after })
}

/// Split a run at a character offset into two detached runs
pub fn split_run(tree: &mut XmlTree, run: NodeId, offset: usize) -> Result<(NodeId, NodeId)> {
    let before = tree.shallow_clone(run)?;
    let after = tree.shallow_clone(run)?;

    let mut consumed = 0;
    for child in tree.children(run).to_vec() {
        if tree.is(child, names::R_PR) {
            copy_to_both(tree, child, before, after)?;
            continue;
        }
        let len = text::run_content_length(tree, child);
        let start = consumed;
        consumed += len;

        if len > 1 && start < offset && offset < consumed {
            let content = tree.inner_text(child);
            let cut = offset - start;
            let head: String = content.chars().take(cut).collect();
            let tail: String = content.chars().skip(cut).collect();
            let head = elements::text_element(tree, &head)?;
            let tail = elements::text_element(tree, &tail)?;
            tree.append_child(before, head)?;
            tree.append_child(after, tail)?;
        } else {
            let target = if goes_before(tree, child, start, len, offset) { before } else { after };
            let copy = tree.deep_clone(child)?;
            tree.append_child(target, copy)?;
        }
    }
    Ok((before, after))
}

/// Make `offset` fall on a run boundary by splitting the run straddling it
/// in place
pub fn ensure_run_boundary(tree: &mut XmlTree, paragraph: NodeId, offset: usize) -> Result<()> {
    let straddling = text::run_spans(tree, paragraph)
        .into_iter()
        .find(|span| span.start < offset && offset < span.end);
    if let Some(span) = straddling {
        let (before, after) = split_run(tree, span.run, offset - span.start)?;
        tree.replace_with(span.run, &[before, after])?;
    }
    Ok(())
}

fn distribute(tree: &mut XmlTree, source: NodeId, before: NodeId, after: NodeId, offset: usize) -> Result<()> {
    let mut consumed = 0;
    for child in tree.children(source).to_vec() {
        if tree.is(child, names::P_PR) {
            split_paragraph_properties(tree, child, before, after)?;
            continue;
        }
        if is_property_element(tree, child) {
            copy_to_both(tree, child, before, after)?;
            continue;
        }

        let len = text::node_text_length(tree, child);
        let start = consumed;
        consumed += len;

        if len > 0 && start < offset && offset < consumed {
            let (head, tail) = split_node(tree, child, offset - start)?;
            tree.append_child(before, head)?;
            tree.append_child(after, tail)?;
        } else {
            let target = if goes_before(tree, child, start, len, offset) { before } else { after };
            let copy = tree.deep_clone(child)?;
            tree.append_child(target, copy)?;
        }
    }
    Ok(())
}

fn split_node(tree: &mut XmlTree, node: NodeId, offset: usize) -> Result<(NodeId, NodeId)> {
    if tree.is(node, names::R) {
        return split_run(tree, node, offset);
    }
    let before = tree.shallow_clone(node)?;
    let after = tree.shallow_clone(node)?;
    distribute(tree, node, before, after, offset)?;
    Ok((before, after))
}

/// Side of the cut for content that is not split. Zero-length content on
/// the cut goes after it, except closing markers (`*End`), which close
/// something that started before.
fn goes_before(tree: &XmlTree, node: NodeId, start: usize, len: usize, offset: usize) -> bool {
    if len > 0 {
        return start + len <= offset;
    }
    start < offset || (start == offset && is_closing_marker(tree, node))
}

fn is_closing_marker(tree: &XmlTree, node: NodeId) -> bool {
    tree.local_name(node).is_some_and(|local| local.ends_with("End"))
}

fn is_property_element(tree: &XmlTree, node: NodeId) -> bool {
    tree.local_name(node).is_some_and(|local| local.ends_with("Pr"))
}

fn copy_to_both(tree: &mut XmlTree, node: NodeId, before: NodeId, after: NodeId) -> Result<()> {
    let first = tree.deep_clone(node)?;
    let second = tree.deep_clone(node)?;
    tree.append_child(before, first)?;
    tree.append_child(after, second)?;
    Ok(())
}

fn split_paragraph_properties(tree: &mut XmlTree, ppr: NodeId, before: NodeId, after: NodeId) -> Result<()> {
    let first = tree.deep_clone(ppr)?;
    if let Some(sect_pr) = tree.first_child_named(first, names::SECT_PR) {
        tree.remove(sect_pr)?;
    }
    let second = tree.deep_clone(ppr)?;
    tree.append_child(before, first)?;
    tree.append_child(after, second)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Formatting, VerticalAlign};

    fn paragraph_of_runs(tree: &mut XmlTree, runs: &[(&str, Formatting)]) -> NodeId {
        let p = tree.create_element(names::P);
        for (content, formatting) in runs {
            let r = elements::run(tree, content, Some(formatting)).unwrap();
            tree.append_child(p, r).unwrap();
        }
        p
    }

    fn formatting_at(tree: &XmlTree, paragraph: NodeId, offset: usize) -> Formatting {
        let span = text::run_spans(tree, paragraph)
            .into_iter()
            .find(|span| span.start <= offset && offset < span.end)
            .unwrap();
        Formatting::of_run(tree, span.run)
    }

    #[test]
    fn test_split_hello_world() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "Hello World", None).unwrap();

        let split = split_paragraph(&mut tree, p, 6).unwrap();

        assert_eq!(text::paragraph_text(&tree, split.before), "Hello ");
        assert_eq!(text::paragraph_text(&tree, split.after), "World");
        assert_eq!(text::paragraph_text(&tree, p), "Hello World");
    }

    #[test]
    fn test_split_on_run_boundary_keeps_runs_whole() {
        let mut tree = XmlTree::new();
        let p = paragraph_of_runs(
            &mut tree,
            &[("bold", Formatting::new().bold(true)), ("plain", Formatting::new())],
        );

        let split = split_paragraph(&mut tree, p, 4).unwrap();

        assert_eq!(text::runs(&tree, split.before).len(), 1);
        assert_eq!(text::runs(&tree, split.after).len(), 1);
        assert_eq!(formatting_at(&tree, split.before, 0).bold, Some(true));
        assert_eq!(formatting_at(&tree, split.after, 0).bold, None);
    }

    #[test]
    fn test_split_inside_formatted_run() {
        let mut tree = XmlTree::new();
        let italic = Formatting::new().italic(true).vertical_align(VerticalAlign::Superscript);
        let p = paragraph_of_runs(&mut tree, &[("abcdef", italic.clone())]);

        let split = split_paragraph(&mut tree, p, 2).unwrap();

        assert_eq!(text::paragraph_text(&tree, split.before), "ab");
        assert_eq!(text::paragraph_text(&tree, split.after), "cdef");
        assert_eq!(formatting_at(&tree, split.before, 1), italic);
        assert_eq!(formatting_at(&tree, split.after, 0), italic);
    }

    #[test]
    fn test_section_break_moves_to_second_half() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "end of section", None).unwrap();
        tree.set_attribute(p, names::ATTR_PARA_ID, "1A2B3C4D").unwrap();
        let ppr = tree.create_element(names::P_PR);
        let style = tree.create_element_with(names::P_STYLE, &[(names::ATTR_VAL, "Heading1")]);
        tree.append_child(ppr, style).unwrap();
        let sect_pr = elements::section_properties(&mut tree).unwrap();
        tree.append_child(ppr, sect_pr).unwrap();
        tree.insert_child(p, 0, ppr).unwrap();

        let split = split_paragraph(&mut tree, p, 3).unwrap();

        let before_ppr = tree.first_child_named(split.before, names::P_PR).unwrap();
        let after_ppr = tree.first_child_named(split.after, names::P_PR).unwrap();
        assert!(tree.first_child_named(before_ppr, names::P_STYLE).is_some());
        assert!(tree.first_child_named(after_ppr, names::P_STYLE).is_some());
        assert!(tree.first_child_named(before_ppr, names::SECT_PR).is_none());
        assert!(tree.first_child_named(after_ppr, names::SECT_PR).is_some());
        assert_eq!(tree.attribute(split.before, names::ATTR_PARA_ID), Some("1A2B3C4D"));
        assert_eq!(tree.attribute(split.after, names::ATTR_PARA_ID), None);
    }

    #[test]
    fn test_markers_on_the_cut() {
        let mut tree = XmlTree::new();
        let p = tree.create_element(names::P);
        let first = elements::run(&mut tree, "one", None).unwrap();
        let (start, end) = elements::bookmark_markers(&mut tree, 0, "mark");
        let second = elements::run(&mut tree, "two", None).unwrap();
        for child in [first, end, start, second] {
            tree.append_child(p, child).unwrap();
        }

        let split = split_paragraph(&mut tree, p, 3).unwrap();

        // the closing marker stays with the text it closes, the opening one
        // moves with the text it opens
        assert_eq!(tree.children_named(split.before, names::BOOKMARK_END).len(), 1);
        assert_eq!(tree.children_named(split.before, names::BOOKMARK_START).len(), 0);
        assert_eq!(tree.children_named(split.after, names::BOOKMARK_START).len(), 1);
        assert_eq!(tree.children_named(split.after, names::BOOKMARK_END).len(), 0);
    }

    #[test]
    fn test_split_through_hyperlink() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "see ", None).unwrap();
        let link = tree.create_element_with(names::HYPERLINK, &[(names::ATTR_R_ID, "rId9")]);
        let inner = elements::run(&mut tree, "example", None).unwrap();
        tree.append_child(link, inner).unwrap();
        tree.append_child(p, link).unwrap();

        let split = split_paragraph(&mut tree, p, 7).unwrap();

        assert_eq!(text::paragraph_text(&tree, split.before), "see exa");
        assert_eq!(text::paragraph_text(&tree, split.after), "mple");
        let tail_link = tree.first_child_named(split.after, names::HYPERLINK).unwrap();
        assert_eq!(tree.attribute(tail_link, names::ATTR_R_ID), Some("rId9"));
    }

    #[test]
    fn test_offset_beyond_length() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "abc", None).unwrap();
        assert!(matches!(split_paragraph(&mut tree, p, 4), Err(EditError::OutOfRange(_))));
    }

    #[test]
    fn test_ensure_run_boundary() {
        let mut tree = XmlTree::new();
        let p = elements::paragraph(&mut tree, "abcdef", Some(&Formatting::new().bold(true))).unwrap();

        ensure_run_boundary(&mut tree, p, 4).unwrap();

        let spans = text::run_spans(&tree, p);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end, spans[1].end), (0, 4, 6));
        assert_eq!(Formatting::of_run(&tree, spans[1].run).bold, Some(true));
    }

    proptest::proptest! {
        #[test]
        fn prop_split_round_trip(
            pieces in proptest::collection::vec(("[a-z ]{1,6}", proptest::bool::ANY), 1..6),
            cut in 0usize..40,
        ) {
            let mut tree = XmlTree::new();
            let runs: Vec<(&str, Formatting)> = pieces
                .iter()
                .map(|(content, bold)| (content.as_str(), Formatting::new().bold(*bold)))
                .collect();
            let p = paragraph_of_runs(&mut tree, &runs);
            let original = text::paragraph_text(&tree, p);
            let length = original.chars().count();
            let cut = cut % (length + 1);

            let split = split_paragraph(&mut tree, p, cut).unwrap();
            let before = text::paragraph_text(&tree, split.before);
            let after = text::paragraph_text(&tree, split.after);

            proptest::prop_assert_eq!(format!("{}{}", before, after), original);
            proptest::prop_assert_eq!(before.chars().count(), cut);
            for offset in 0..length {
                let expected = formatting_at(&tree, p, offset);
                let actual = if offset < cut {
                    formatting_at(&tree, split.before, offset)
                } else {
                    formatting_at(&tree, split.after, offset - cut)
                };
                proptest::prop_assert_eq!(actual, expected);
            }
        }
    }
}
