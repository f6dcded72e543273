//! Numbering lookups over the numbering part
//!
//! Paragraphs reference list definitions through `w:pPr/w:numPr`
//! (`w:numId` + `w:ilvl`). The numbering part maps each `w:num` to a
//! `w:abstractNum` whose levels carry the number format; `bullet` marks a
//! bulleted level.

use crate::{names, NodeId, Result, XmlTree};
use serde::{Deserialize, Serialize};

/// Kind of list a paragraph belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListItemType {
    Bulleted,
    Numbered,
}

/// The `numId`/`ilvl` pair of a list paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberingReference {
    pub num_id: u32,
    pub ilvl: u8,
}

impl NumberingReference {
    /// Read `w:pPr/w:numPr` of a paragraph. `numId` 0 means "no list".
    pub fn of_paragraph(tree: &XmlTree, paragraph: NodeId) -> Option<Self> {
        let ppr = tree.first_child_named(paragraph, names::P_PR)?;
        let num_pr = tree.first_child_named(ppr, names::NUM_PR)?;
        let num_id = child_val(tree, num_pr, names::NUM_ID)?.parse::<u32>().ok()?;
        if num_id == 0 {
            return None;
        }
        let ilvl = child_val(tree, num_pr, names::ILVL)
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(0);
        Some(Self { num_id, ilvl })
    }

    /// Write `w:numPr` into a paragraph, creating `w:pPr` if needed
    pub fn apply(&self, tree: &mut XmlTree, paragraph: NodeId) -> Result<()> {
        let ppr = match tree.first_child_named(paragraph, names::P_PR) {
            Some(ppr) => ppr,
            None => {
                let ppr = tree.create_element(names::P_PR);
                tree.insert_child(paragraph, 0, ppr)?;
                ppr
            }
        };
        if let Some(existing) = tree.first_child_named(ppr, names::NUM_PR) {
            tree.remove(existing)?;
        }
        let num_pr = tree.create_element(names::NUM_PR);
        let ilvl = tree.create_element_with(names::ILVL, &[(names::ATTR_VAL, self.ilvl.to_string().as_str())]);
        let num_id =
            tree.create_element_with(names::NUM_ID, &[(names::ATTR_VAL, self.num_id.to_string().as_str())]);
        tree.append_child(num_pr, ilvl)?;
        tree.append_child(num_pr, num_id)?;
        // numPr follows pStyle and the keep/page-break toggles
        let anchor = tree
            .children(ppr)
            .iter()
            .copied()
            .find(|c| !tree.is(*c, names::P_STYLE) && !is_keep_toggle(tree, *c));
        match anchor {
            Some(next) => tree.insert_before(next, num_pr),
            None => tree.append_child(ppr, num_pr),
        }
    }
}

fn is_keep_toggle(tree: &XmlTree, node: NodeId) -> bool {
    matches!(
        tree.name(node),
        Some("w:keepNext") | Some("w:keepLines") | Some("w:pageBreakBefore") | Some("w:framePr") | Some("w:widowControl")
    )
}

fn child_val<'a>(tree: &'a XmlTree, parent: NodeId, name: &str) -> Option<&'a str> {
    let child = tree.first_child_named(parent, name)?;
    tree.attribute(child, names::ATTR_VAL)
}

fn find_by_attr(tree: &XmlTree, parent: NodeId, name: &str, attr: &str, value: &str) -> Option<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .find(|c| tree.is(*c, name) && tree.attribute(*c, attr) == Some(value))
}

/// Number format (`decimal`, `bullet`, ...) of a list level
pub fn level_format(tree: &XmlTree, numbering: NodeId, num_id: u32, ilvl: u8) -> Option<String> {
    let num = find_by_attr(tree, numbering, names::NUM, "w:numId", &num_id.to_string())?;
    let abstract_id = child_val(tree, num, names::ABSTRACT_NUM_ID)?;
    let abstract_num = find_by_attr(tree, numbering, names::ABSTRACT_NUM, "w:abstractNumId", abstract_id)?;
    let lvl = find_by_attr(tree, abstract_num, names::LVL, "w:ilvl", &ilvl.to_string())?;
    child_val(tree, lvl, names::NUM_FMT).map(str::to_string)
}

/// Resolve whether a list level is bulleted or numbered. Unknown
/// definitions are treated as numbered.
pub fn list_item_type(tree: &XmlTree, numbering: Option<NodeId>, num_id: u32, ilvl: u8) -> ListItemType {
    match numbering.and_then(|root| level_format(tree, root, num_id, ilvl)) {
        Some(format) if format == "bullet" => ListItemType::Bulleted,
        _ => ListItemType::Numbered,
    }
}

/// Append a new nine-level list definition and return its `numId`
pub fn add_list_definition(
    tree: &mut XmlTree,
    numbering: NodeId,
    list_type: ListItemType,
    start: u32,
) -> Result<u32> {
    let next_abstract = max_id(tree, numbering, names::ABSTRACT_NUM, "w:abstractNumId") + 1;
    let next_num = max_id(tree, numbering, names::NUM, "w:numId") + 1;

    let abstract_id = next_abstract.to_string();
    let abstract_num =
        tree.create_element_with(names::ABSTRACT_NUM, &[("w:abstractNumId", abstract_id.as_str())]);
    let multi = tree.create_element_with(names::MULTI_LEVEL_TYPE, &[(names::ATTR_VAL, "hybridMultilevel")]);
    tree.append_child(abstract_num, multi)?;

    for level in 0u8..9 {
        let lvl = build_level(tree, level, list_type, start)?;
        tree.append_child(abstract_num, lvl)?;
    }

    // abstractNum elements must precede every num element
    match tree.first_child_named(numbering, names::NUM) {
        Some(first_num) => tree.insert_before(first_num, abstract_num)?,
        None => tree.append_child(numbering, abstract_num)?,
    }

    let num_id = next_num.to_string();
    let num = tree.create_element_with(names::NUM, &[("w:numId", num_id.as_str())]);
    let reference = tree.create_element_with(names::ABSTRACT_NUM_ID, &[(names::ATTR_VAL, abstract_id.as_str())]);
    tree.append_child(num, reference)?;
    tree.append_child(numbering, num)?;

    Ok(next_num)
}

fn build_level(tree: &mut XmlTree, level: u8, list_type: ListItemType, start: u32) -> Result<NodeId> {
    let ilvl = level.to_string();
    let lvl = tree.create_element_with(names::LVL, &[("w:ilvl", ilvl.as_str())]);

    let (format, text) = match list_type {
        ListItemType::Bulleted => ("bullet".to_string(), ["\u{2022}", "o", "\u{25AA}"][level as usize % 3].to_string()),
        ListItemType::Numbered => {
            let format = ["decimal", "lowerLetter", "lowerRoman"][level as usize % 3];
            (format.to_string(), format!("%{}.", level + 1))
        }
    };
    let left = (720 * (level as u32 + 1)).to_string();
    let start = start.to_string();

    let children = [
        tree.create_element_with(names::START, &[(names::ATTR_VAL, start.as_str())]),
        tree.create_element_with(names::NUM_FMT, &[(names::ATTR_VAL, format.as_str())]),
        tree.create_element_with(names::LVL_TEXT, &[(names::ATTR_VAL, text.as_str())]),
        tree.create_element_with(names::LVL_JC, &[(names::ATTR_VAL, "left")]),
    ];
    for child in children {
        tree.append_child(lvl, child)?;
    }

    let ppr = tree.create_element(names::P_PR);
    let ind = tree.create_element_with(names::IND, &[("w:left", left.as_str()), ("w:hanging", "360")]);
    tree.append_child(ppr, ind)?;
    tree.append_child(lvl, ppr)?;
    Ok(lvl)
}

fn max_id(tree: &XmlTree, numbering: NodeId, name: &str, attr: &str) -> u32 {
    tree.children_named(numbering, name)
        .into_iter()
        .filter_map(|n| tree.attribute(n, attr).and_then(|v| v.parse::<u32>().ok()))
        .max()
        .unwrap_or(0)
}
