//! Run-level text edits inside one paragraph
//!
//! Edits first carve run boundaries at the affected offsets, so formatting
//! outside the edited range is never touched.

use crate::splitter::ensure_run_boundary;
use crate::{revision, EditError, Result, RevisionIds, RevisionInfo};
use doc_model::{elements, names, text, Formatting, NodeId, XmlTree};

/// Runs lying inside `[start, end)` once boundaries have been carved.
/// Zero-length runs strictly inside the range are included.
fn runs_in_range(tree: &XmlTree, paragraph: NodeId, start: usize, end: usize) -> Vec<NodeId> {
    text::run_spans(tree, paragraph)
        .into_iter()
        .filter(|span| {
            if span.is_empty() {
                span.start > start && span.start < end
            } else {
                span.start >= start && span.end <= end
            }
        })
        .map(|span| span.run)
        .collect()
}

fn check_range(tree: &XmlTree, paragraph: NodeId, start: usize, end: usize) -> Result<()> {
    let length = text::text_length(tree, paragraph);
    if start > end || end > length {
        return Err(EditError::OutOfRange(format!(
            "range {}..{} outside paragraph of length {}",
            start, end, length
        )));
    }
    Ok(())
}

fn properties_of(tree: &mut XmlTree, run: NodeId) -> Result<Option<NodeId>> {
    match tree.first_child_named(run, names::R_PR) {
        Some(rpr) => Ok(Some(tree.deep_clone(rpr)?)),
        None => Ok(None),
    }
}

fn build_run(
    tree: &mut XmlTree,
    content: &str,
    formatting: Option<&Formatting>,
    template: Option<NodeId>,
) -> Result<NodeId> {
    match formatting {
        Some(formatting) => Ok(elements::run(tree, content, Some(formatting))?),
        None => {
            let rpr = match template {
                Some(run) => properties_of(tree, run)?,
                None => None,
            };
            Ok(elements::run_with_properties(tree, content, rpr)?)
        }
    }
}

/// Replace the characters `[start, end)` of a paragraph with `replacement`.
///
/// The new text takes the formatting of the first replaced run unless
/// `formatting` is given, in which case it is written into a new run with
/// exactly that formatting. With `revision` the old runs are kept as tracked
/// deletions and the new run is recorded as a tracked insertion.
pub fn replace_range(
    tree: &mut XmlTree,
    paragraph: NodeId,
    start: usize,
    end: usize,
    replacement: &str,
    formatting: Option<&Formatting>,
    revision: Option<&RevisionInfo>,
) -> Result<()> {
    check_range(tree, paragraph, start, end)?;
    if start == end {
        return insert_text(tree, paragraph, start, replacement, formatting, revision);
    }

    ensure_run_boundary(tree, paragraph, start)?;
    ensure_run_boundary(tree, paragraph, end)?;
    let doomed = runs_in_range(tree, paragraph, start, end);
    let Some(&first) = doomed.first() else {
        return Ok(());
    };

    let mut ids = RevisionIds::for_node(tree, paragraph);
    if !replacement.is_empty() {
        let run = build_run(tree, replacement, formatting, Some(first))?;
        tree.insert_before(first, run)?;
        if let Some(info) = revision {
            revision::mark_inserted(tree, run, info, &mut ids)?;
        }
    }
    for run in doomed {
        match revision {
            Some(info) => {
                revision::mark_deleted(tree, run, info, &mut ids)?;
            }
            None => tree.remove(run)?,
        }
    }
    Ok(())
}

/// Insert text at a character offset of a paragraph. Without explicit
/// formatting the new run copies the formatting of its neighbour.
pub fn insert_text(
    tree: &mut XmlTree,
    paragraph: NodeId,
    offset: usize,
    content: &str,
    formatting: Option<&Formatting>,
    revision: Option<&RevisionInfo>,
) -> Result<()> {
    check_range(tree, paragraph, offset, offset)?;
    if content.is_empty() {
        return Ok(());
    }
    ensure_run_boundary(tree, paragraph, offset)?;

    let spans = text::run_spans(tree, paragraph);
    let next = spans.iter().find(|span| span.start == offset && !span.is_empty());
    let previous = spans.iter().rev().find(|span| span.end == offset && !span.is_empty());

    let run = match (next, previous) {
        (Some(next), _) => {
            let run = build_run(tree, content, formatting, Some(next.run))?;
            tree.insert_before(next.run, run)?;
            run
        }
        (None, Some(previous)) => {
            let run = build_run(tree, content, formatting, Some(previous.run))?;
            tree.insert_after(previous.run, run)?;
            run
        }
        (None, None) => {
            let run = build_run(tree, content, formatting, None)?;
            tree.append_child(paragraph, run)?;
            run
        }
    };
    if let Some(info) = revision {
        let mut ids = RevisionIds::for_node(tree, paragraph);
        revision::mark_inserted(tree, run, info, &mut ids)?;
    }
    Ok(())
}

/// Remove `count` characters starting at `offset`
pub fn remove_text(
    tree: &mut XmlTree,
    paragraph: NodeId,
    offset: usize,
    count: usize,
    revision: Option<&RevisionInfo>,
) -> Result<()> {
    if count == 0 {
        return check_range(tree, paragraph, offset, offset);
    }
    replace_range(tree, paragraph, offset, offset + count, "", None, revision)
}
