//! Text extraction
//!
//! Flattens paragraph-level markup into the plain text the engine indexes and
//! searches. Special run content (tabs, breaks, symbols) counts as a single
//! character; field codes, deleted text, drawings and compatibility fallbacks
//! contribute nothing. All lengths are counted in `char`s.

use crate::{names, NodeId, XmlTree};

/// Elements whose subtree never contributes text
const SKIPPED: &[&str] = &[
    names::P_PR,
    names::R_PR,
    names::DEL,
    names::MOVE_FROM,
    names::MC_FALLBACK,
    names::TXBX_CONTENT,
    names::DRAWING,
    names::PICT,
    names::OBJECT,
    names::SDT_PR,
    names::SDT_END_PR,
    names::P,
    names::TBL,
];

/// A run together with the character range it covers in its paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSpan {
    /// The `w:r` element
    pub run: NodeId,
    /// Offset of the first character of the run
    pub start: usize,
    /// Offset just past the last character of the run
    pub end: usize,
}

impl RunSpan {
    /// Number of characters in the run
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check whether the run contributes no text
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check whether the run overlaps the half-open range `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Check whether a subtree is excluded from text extraction
pub fn is_text_skipped(tree: &XmlTree, node: NodeId) -> bool {
    tree.name(node).is_some_and(|name| SKIPPED.contains(&name))
}

/// Text contributed by a single child of a run, None for non-text content
pub fn run_content_text(tree: &XmlTree, node: NodeId) -> Option<String> {
    let name = tree.name(node)?;
    match name {
        names::T => Some(tree.inner_text(node)),
        names::TAB | names::PTAB => Some("\t".to_string()),
        names::BR | names::CR => Some("\n".to_string()),
        names::NO_BREAK_HYPHEN => Some("-".to_string()),
        names::SYM => {
            let ch = tree
                .attribute(node, names::ATTR_CHAR)
                .and_then(|code| u32::from_str_radix(code, 16).ok())
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Some(ch.to_string())
        }
        _ => None,
    }
}

/// Character length of a single run child
pub fn run_content_length(tree: &XmlTree, node: NodeId) -> usize {
    run_content_text(tree, node)
        .map(|t| t.chars().count())
        .unwrap_or(0)
}

/// Flattened text of a run
pub fn run_text(tree: &XmlTree, run: NodeId) -> String {
    tree.children(run)
        .iter()
        .filter_map(|child| run_content_text(tree, *child))
        .collect()
}

/// All runs of a paragraph in document order, including those nested in
/// hyperlinks, insertions, content controls and other run containers
pub fn runs(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    collect_runs(tree, paragraph, &mut result);
    result
}

fn collect_runs(tree: &XmlTree, node: NodeId, out: &mut Vec<NodeId>) {
    for child in tree.children(node) {
        if !tree.is_element(*child) || is_text_skipped(tree, *child) {
            continue;
        }
        if tree.is(*child, names::R) {
            out.push(*child);
        } else {
            collect_runs(tree, *child, out);
        }
    }
}

/// Runs of a paragraph with their character ranges
pub fn run_spans(tree: &XmlTree, paragraph: NodeId) -> Vec<RunSpan> {
    let mut offset = 0;
    runs(tree, paragraph)
        .into_iter()
        .map(|run| {
            let len = run_text(tree, run).chars().count();
            let span = RunSpan {
                run,
                start: offset,
                end: offset + len,
            };
            offset += len;
            span
        })
        .collect()
}

/// Flattened text of a paragraph
pub fn paragraph_text(tree: &XmlTree, paragraph: NodeId) -> String {
    runs(tree, paragraph)
        .into_iter()
        .map(|run| run_text(tree, run))
        .collect()
}

/// Character length of the flattened text of a paragraph
pub fn text_length(tree: &XmlTree, paragraph: NodeId) -> usize {
    paragraph_text(tree, paragraph).chars().count()
}

/// Character length contributed by any paragraph-level node: a run, a run
/// container (hyperlink, insertion, content control, ...) or a marker
pub fn node_text_length(tree: &XmlTree, node: NodeId) -> usize {
    if !tree.is_element(node) || is_text_skipped(tree, node) {
        return 0;
    }
    if tree.is(node, names::R) {
        return run_text(tree, node).chars().count();
    }
    tree.children(node)
        .iter()
        .map(|child| node_text_length(tree, *child))
        .sum()
}

/// Convert a byte offset into a char offset
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset.min(text.len())].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(tree: &mut XmlTree, children: &[NodeId]) -> NodeId {
        let r = tree.create_element(names::R);
        for child in children {
            tree.append_child(r, *child).unwrap();
        }
        r
    }

    fn text_element(tree: &mut XmlTree, text: &str) -> NodeId {
        let t = tree.create_element(names::T);
        tree.set_element_text(t, text).unwrap();
        t
    }

    #[test]
    fn test_special_content_counts_as_one_char() {
        let mut tree = XmlTree::new();
        let p = tree.create_element(names::P);
        let a = text_element(&mut tree, "a");
        let tab = tree.create_element(names::TAB);
        let br = tree.create_element(names::BR);
        let sym = tree.create_element_with(names::SYM, &[(names::ATTR_CHAR, "0041")]);
        let r = run_with(&mut tree, &[a, tab, br, sym]);
        tree.append_child(p, r).unwrap();

        assert_eq!(paragraph_text(&tree, p), "a\t\nA");
        assert_eq!(text_length(&tree, p), 4);
    }

    #[test]
    fn test_deleted_and_field_code_text_ignored() {
        let mut tree = XmlTree::new();
        let p = tree.create_element(names::P);

        let kept = text_element(&mut tree, "kept");
        let kept_run = run_with(&mut tree, &[kept]);
        tree.append_child(p, kept_run).unwrap();

        let del = tree.create_element(names::DEL);
        let gone = tree.create_element(names::DEL_TEXT);
        tree.set_element_text(gone, "gone").unwrap();
        let del_run = run_with(&mut tree, &[gone]);
        tree.append_child(del, del_run).unwrap();
        tree.append_child(p, del).unwrap();

        let instr = tree.create_element(names::INSTR_TEXT);
        tree.set_element_text(instr, " PAGE ").unwrap();
        let field_run = run_with(&mut tree, &[instr]);
        tree.append_child(p, field_run).unwrap();

        assert_eq!(paragraph_text(&tree, p), "kept");
        assert_eq!(runs(&tree, p).len(), 2);
    }

    #[test]
    fn test_run_spans_through_hyperlink() {
        let mut tree = XmlTree::new();
        let p = tree.create_element(names::P);
        let t1 = text_element(&mut tree, "Go to ");
        let r1 = run_with(&mut tree, &[t1]);
        tree.append_child(p, r1).unwrap();
        let link = tree.create_element(names::HYPERLINK);
        let t2 = text_element(&mut tree, "site");
        let r2 = run_with(&mut tree, &[t2]);
        tree.append_child(link, r2).unwrap();
        tree.append_child(p, link).unwrap();

        let spans = run_spans(&tree, p);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 6));
        assert_eq!((spans[1].start, spans[1].end), (6, 10));
        assert!(spans[1].overlaps(8, 12));
        assert!(!spans[0].overlaps(6, 7));
        assert_eq!(node_text_length(&tree, link), 4);
    }

    #[test]
    fn test_char_offset_multibyte() {
        let text = "héllo";
        assert_eq!(char_offset(text, 3), 2);
        assert_eq!(char_offset(text, text.len()), 5);
    }
}
