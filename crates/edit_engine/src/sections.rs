//! Sections
//!
//! The body is divided into sections by `w:sectPr` markers: a paragraph
//! carrying `w:pPr/w:sectPr` closes a section, and the `w:sectPr` at the end
//! of `w:body` closes the last one.

use crate::header_footer::{self, HeaderFooterKind, HeaderFooterType};
use crate::{Container, ContainerKind, EditError, Paragraph, Result};
use doc_model::{elements, names, NodeId, XmlTree};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a section starts relative to the previous one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionBreak {
    #[default]
    NextPage,
    Continuous,
    EvenPage,
    OddPage,
    NextColumn,
}

impl SectionBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionBreak::NextPage => "nextPage",
            SectionBreak::Continuous => "continuous",
            SectionBreak::EvenPage => "evenPage",
            SectionBreak::OddPage => "oddPage",
            SectionBreak::NextColumn => "nextColumn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "nextPage" => Some(SectionBreak::NextPage),
            "continuous" => Some(SectionBreak::Continuous),
            "evenPage" => Some(SectionBreak::EvenPage),
            "oddPage" => Some(SectionBreak::OddPage),
            "nextColumn" => Some(SectionBreak::NextColumn),
            _ => None,
        }
    }
}

/// One section of the body
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    index: usize,
    sect_pr: Option<NodeId>,
    paragraphs: Vec<Paragraph>,
}

impl Section {
    /// Position of the section in the body
    pub fn index(&self) -> usize {
        self.index
    }

    /// The `w:sectPr` closing the section; None when the body has none
    pub fn section_properties(&self) -> Option<NodeId> {
        self.sect_pr
    }

    /// Paragraphs physically inside the section
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn break_type(&self, tree: &XmlTree) -> SectionBreak {
        self.sect_pr
            .and_then(|sect_pr| tree.first_child_named(sect_pr, names::TYPE))
            .and_then(|t| tree.attribute(t, names::ATTR_VAL))
            .and_then(SectionBreak::parse)
            .unwrap_or_default()
    }

    /// Header references as (page kind, relationship id)
    pub fn headers(&self, tree: &XmlTree) -> Vec<(HeaderFooterKind, String)> {
        self.sect_pr
            .map(|sect_pr| header_footer::references(tree, sect_pr, HeaderFooterType::Header))
            .unwrap_or_default()
    }

    /// Footer references as (page kind, relationship id)
    pub fn footers(&self, tree: &XmlTree) -> Vec<(HeaderFooterKind, String)> {
        self.sect_pr
            .map(|sect_pr| header_footer::references(tree, sect_pr, HeaderFooterType::Footer))
            .unwrap_or_default()
    }

    pub fn text(&self, tree: &XmlTree) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text(tree))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `w:pPr/w:sectPr` of a paragraph
fn section_marker(tree: &XmlTree, paragraph: NodeId) -> Option<NodeId> {
    let ppr = tree.first_child_named(paragraph, names::P_PR)?;
    tree.first_child_named(ppr, names::SECT_PR)
}

/// Position among the root's children of the paragraph closing a section
fn closing_position(tree: &XmlTree, section: &Section) -> Option<usize> {
    let ppr = tree.parent(section.sect_pr?)?;
    let paragraph = tree.parent(ppr)?;
    tree.index_in_parent(paragraph)
}

/// Replace the `w:type` of a `w:sectPr`
fn set_break_type(tree: &mut XmlTree, sect_pr: NodeId, break_type: SectionBreak) -> Result<()> {
    for existing in tree.children_named(sect_pr, names::TYPE) {
        tree.remove(existing)?;
    }
    let node = tree.create_element_with(names::TYPE, &[(names::ATTR_VAL, break_type.as_str())]);
    let next = tree.children(sect_pr).iter().copied().find(|c| {
        !matches!(
            tree.name(*c),
            Some(names::HEADER_REFERENCE) | Some(names::FOOTER_REFERENCE) | Some("w:footnotePr") | Some("w:endnotePr")
        )
    });
    match next {
        Some(next) => tree.insert_before(next, node)?,
        None => tree.append_child(sect_pr, node)?,
    }
    Ok(())
}

impl Container {
    /// The trailing `w:sectPr` of the scope
    pub fn body_section_properties(&self, tree: &XmlTree) -> Option<NodeId> {
        tree.children_named(self.root(), names::SECT_PR).last().copied()
    }

    pub(crate) fn ensure_body_section_properties(&mut self, tree: &mut XmlTree) -> Result<NodeId> {
        if let Some(sect_pr) = self.body_section_properties(tree) {
            return Ok(sect_pr);
        }
        let sect_pr = elements::section_properties(tree)?;
        tree.append_child(self.root(), sect_pr)?;
        Ok(sect_pr)
    }

    /// Sections of the scope in document order
    pub fn sections(&mut self, tree: &XmlTree) -> Vec<Section> {
        let root = self.root();
        let mut sections = Vec::new();
        let mut current = Vec::new();

        for paragraph in self.paragraphs(tree) {
            let mut paragraph = paragraph.clone();
            if paragraph.parent_container == ContainerKind::Body {
                paragraph.parent_container = ContainerKind::Section;
            }
            let marker = (tree.parent(paragraph.node()) == Some(root))
                .then(|| section_marker(tree, paragraph.node()))
                .flatten();
            current.push(paragraph);
            if let Some(marker) = marker {
                sections.push(Section {
                    index: sections.len(),
                    sect_pr: Some(marker),
                    paragraphs: std::mem::take(&mut current),
                });
            }
        }

        let body_sect_pr = self.body_section_properties(tree);
        if !current.is_empty() || body_sect_pr.is_some() || sections.is_empty() {
            sections.push(Section {
                index: sections.len(),
                sect_pr: body_sect_pr,
                paragraphs: current,
            });
        }
        sections
    }

    /// Close the current last section and start a new one. The closed
    /// section keeps a copy of the body section properties.
    pub fn insert_section(&mut self, tree: &mut XmlTree, page_break: bool) -> Result<Section> {
        let body_sect_pr = self.ensure_body_section_properties(tree)?;
        let copy = tree.deep_clone(body_sect_pr)?;
        let paragraph = tree.create_element(names::P);
        let ppr = tree.create_element(names::P_PR);
        tree.append_child(ppr, copy)?;
        tree.append_child(paragraph, ppr)?;
        self.append_block(tree, paragraph)?;

        let break_type = if page_break { SectionBreak::NextPage } else { SectionBreak::Continuous };
        set_break_type(tree, body_sect_pr, break_type)?;
        self.clear_paragraphs_cache();

        let sections = self.sections(tree);
        debug!(sections = sections.len(), ?break_type, "inserted section");
        sections
            .into_iter()
            .last()
            .ok_or_else(|| EditError::OperationNotAllowed("scope has no sections".to_string()))
    }

    /// Remove a section with its paragraphs and tables. The only section
    /// cannot be removed.
    pub fn remove_section(&mut self, tree: &mut XmlTree, index: usize) -> Result<()> {
        let sections = self.sections(tree);
        if sections.len() <= 1 {
            return Err(EditError::OperationNotAllowed("cannot remove the only section".to_string()));
        }
        if index >= sections.len() {
            return Err(EditError::OutOfRange(format!(
                "section index {} outside 0..{}",
                index,
                sections.len()
            )));
        }

        let is_last = index == sections.len() - 1;
        let children = tree.children(self.root()).to_vec();
        let start = match index {
            0 => 0,
            _ => closing_position(tree, &sections[index - 1]).map_or(0, |p| p + 1),
        };
        let end = if is_last {
            children.len()
        } else {
            closing_position(tree, &sections[index]).map_or(start, |p| p + 1)
        };

        for child in &children[start..end.max(start)] {
            if !tree.is(*child, names::SECT_PR) {
                tree.remove(*child)?;
            }
        }

        // the previous section now ends the body
        if is_last {
            if let Some(previous) = sections[index - 1].sect_pr {
                tree.detach(previous)?;
                match self.body_section_properties(tree) {
                    Some(body_sect_pr) => tree.replace_with(body_sect_pr, &[previous])?,
                    None => tree.append_child(self.root(), previous)?,
                }
            }
        }

        self.clear_paragraphs_cache();
        debug!(index, "removed section");
        Ok(())
    }
}
