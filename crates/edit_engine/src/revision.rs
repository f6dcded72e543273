//! Tracked changes
//!
//! Tracked edits wrap runs in `w:ins`/`w:del` carrying an id, the author and
//! a timestamp. Deleted runs have their `w:t` renamed to `w:delText` so they
//! drop out of the flattened text. Adjacent deletion blocks are not merged.

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use doc_model::{names, NodeId, XmlTree};

const DEL_INSTR_TEXT: &str = "w:delInstrText";
const PPR_CHANGE: &str = "w:pPrChange";

/// Author and time recorded on a tracked change
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionInfo {
    pub author: String,
    pub date: DateTime<Utc>,
}

impl RevisionInfo {
    /// Attribute a change to `author`, stamped with the current time
    pub fn now(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            date: Utc::now(),
        }
    }

    fn date_attribute(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Allocates revision ids unique within one part
#[derive(Debug)]
pub struct RevisionIds {
    next: u32,
}

impl RevisionIds {
    /// Start after the highest revision id used in the part containing `node`
    pub fn for_node(tree: &XmlTree, node: NodeId) -> Self {
        let root = tree.ancestors(node).last().unwrap_or(node);
        let highest = tree
            .descendants(root)
            .into_iter()
            .filter(|d| tree.is(*d, names::INS) || tree.is(*d, names::DEL))
            .filter_map(|d| tree.attribute(d, names::ATTR_ID).and_then(|id| id.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        Self { next: highest + 1 }
    }

    fn allocate(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}

fn revision_element(tree: &mut XmlTree, name: &str, info: &RevisionInfo, ids: &mut RevisionIds) -> NodeId {
    let id = ids.allocate();
    let date = info.date_attribute();
    tree.create_element_with(
        name,
        &[
            (names::ATTR_ID, id.as_str()),
            (names::ATTR_AUTHOR, info.author.as_str()),
            (names::ATTR_DATE, date.as_str()),
        ],
    )
}

fn wrap(tree: &mut XmlTree, node: NodeId, wrapper: NodeId) -> Result<()> {
    tree.insert_before(node, wrapper)?;
    tree.detach(node)?;
    tree.append_child(wrapper, node)?;
    Ok(())
}

/// Wrap an attached run in `w:ins`, returning the wrapper
pub fn mark_inserted(tree: &mut XmlTree, run: NodeId, info: &RevisionInfo, ids: &mut RevisionIds) -> Result<NodeId> {
    let ins = revision_element(tree, names::INS, info, ids);
    wrap(tree, run, ins)?;
    Ok(ins)
}

/// Wrap an attached run in `w:del` and turn its text into deleted text
pub fn mark_deleted(tree: &mut XmlTree, run: NodeId, info: &RevisionInfo, ids: &mut RevisionIds) -> Result<NodeId> {
    for child in tree.children(run).to_vec() {
        if tree.is(child, names::T) {
            tree.rename(child, names::DEL_TEXT)?;
        } else if tree.is(child, names::INSTR_TEXT) {
            tree.rename(child, DEL_INSTR_TEXT)?;
        }
    }
    let del = revision_element(tree, names::DEL, info, ids);
    wrap(tree, run, del)?;
    Ok(del)
}

/// Record the paragraph mark itself as deleted (`w:pPr/w:rPr/w:del`)
pub fn mark_paragraph_mark_deleted(
    tree: &mut XmlTree,
    paragraph: NodeId,
    info: &RevisionInfo,
    ids: &mut RevisionIds,
) -> Result<()> {
    let ppr = match tree.first_child_named(paragraph, names::P_PR) {
        Some(ppr) => ppr,
        None => {
            let ppr = tree.create_element(names::P_PR);
            tree.insert_child(paragraph, 0, ppr)?;
            ppr
        }
    };
    let rpr = match tree.first_child_named(ppr, names::R_PR) {
        Some(rpr) => rpr,
        None => {
            let rpr = tree.create_element(names::R_PR);
            // the mark's rPr precedes sectPr and pPrChange
            let anchor = tree
                .children(ppr)
                .iter()
                .copied()
                .find(|c| tree.is(*c, names::SECT_PR) || tree.is(*c, PPR_CHANGE));
            match anchor {
                Some(anchor) => tree.insert_before(anchor, rpr)?,
                None => tree.append_child(ppr, rpr)?,
            }
            rpr
        }
    };
    if tree.first_child_named(rpr, names::DEL).is_none() {
        let del = revision_element(tree, names::DEL, info, ids);
        tree.append_child(rpr, del)?;
    }
    Ok(())
}
