//! Headers and footers
//!
//! Each header or footer is its own part (`w:hdr`/`w:ftr` root) reached from
//! the main document part through a relationship. Sections point at them
//! with `w:headerReference`/`w:footerReference` elements carrying the
//! relationship id and the page kind.

use crate::{Container, ContainerKind, Result};
use doc_model::{names, NodeId, XmlTree};
use serde::{Deserialize, Serialize};
use store::docx::{content_type_values, relationship_types, template};

/// Which pages of a section a header or footer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderFooterKind {
    Default,
    First,
    Even,
}

impl HeaderFooterKind {
    /// Value of the reference's `w:type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderFooterKind::Default => "default",
            HeaderFooterKind::First => "first",
            HeaderFooterKind::Even => "even",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(HeaderFooterKind::Default),
            "first" => Some(HeaderFooterKind::First),
            "even" => Some(HeaderFooterKind::Even),
            _ => None,
        }
    }
}

/// Header or footer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderFooterType {
    Header,
    Footer,
}

impl HeaderFooterType {
    /// Name of the reference element in `w:sectPr`
    pub fn reference_name(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => names::HEADER_REFERENCE,
            HeaderFooterType::Footer => names::FOOTER_REFERENCE,
        }
    }

    /// Name of the part's root element
    pub fn root_name(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => names::HDR,
            HeaderFooterType::Footer => names::FTR,
        }
    }

    pub fn relationship_type(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => relationship_types::HEADER,
            HeaderFooterType::Footer => relationship_types::FOOTER,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => content_type_values::HEADER,
            HeaderFooterType::Footer => content_type_values::FOOTER,
        }
    }

    /// Markup of a new, empty part
    pub fn template(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => template::HEADER_XML,
            HeaderFooterType::Footer => template::FOOTER_XML,
        }
    }

    /// Prefix for new part names (`word/header1.xml`, ...)
    pub fn part_prefix(&self) -> &'static str {
        match self {
            HeaderFooterType::Header => "word/header",
            HeaderFooterType::Footer => "word/footer",
        }
    }

    pub fn container_kind(&self) -> ContainerKind {
        match self {
            HeaderFooterType::Header => ContainerKind::Header,
            HeaderFooterType::Footer => ContainerKind::Footer,
        }
    }
}

/// A loaded header or footer part
#[derive(Debug, Clone)]
pub struct HeaderFooter {
    kind: HeaderFooterType,
    part_name: String,
    relationship_id: String,
    container: Container,
}

impl HeaderFooter {
    pub fn new(kind: HeaderFooterType, part_name: impl Into<String>, relationship_id: impl Into<String>, root: NodeId) -> Self {
        Self {
            kind,
            part_name: part_name.into(),
            relationship_id: relationship_id.into(),
            container: Container::new(kind.container_kind(), root),
        }
    }

    pub fn kind(&self) -> HeaderFooterType {
        self.kind
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// Id of the main part's relationship to this part
    pub fn relationship_id(&self) -> &str {
        &self.relationship_id
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}

/// References of one type in a `w:sectPr`, as (page kind, relationship id)
pub fn references(tree: &XmlTree, sect_pr: NodeId, kind: HeaderFooterType) -> Vec<(HeaderFooterKind, String)> {
    tree.children_named(sect_pr, kind.reference_name())
        .into_iter()
        .filter_map(|reference| {
            let page = tree
                .attribute(reference, names::ATTR_TYPE)
                .map_or(Some(HeaderFooterKind::Default), HeaderFooterKind::parse)?;
            let id = tree.attribute(reference, names::ATTR_R_ID)?;
            Some((page, id.to_string()))
        })
        .collect()
}

/// Point a section at a header/footer part, replacing any reference of the
/// same type and page kind. A first-page reference also turns on
/// `w:titlePg`.
pub fn set_reference(
    tree: &mut XmlTree,
    sect_pr: NodeId,
    kind: HeaderFooterType,
    page: HeaderFooterKind,
    relationship_id: &str,
) -> Result<()> {
    for existing in tree.children_named(sect_pr, kind.reference_name()) {
        let existing_page = tree
            .attribute(existing, names::ATTR_TYPE)
            .map_or(Some(HeaderFooterKind::Default), HeaderFooterKind::parse);
        if existing_page == Some(page) {
            tree.remove(existing)?;
        }
    }

    let reference = tree.create_element_with(
        kind.reference_name(),
        &[(names::ATTR_TYPE, page.as_str()), (names::ATTR_R_ID, relationship_id)],
    );
    // references lead the section properties
    let first_other = tree
        .children(sect_pr)
        .iter()
        .copied()
        .find(|c| !tree.is(*c, names::HEADER_REFERENCE) && !tree.is(*c, names::FOOTER_REFERENCE));
    match first_other {
        Some(next) => tree.insert_before(next, reference)?,
        None => tree.append_child(sect_pr, reference)?,
    }

    if page == HeaderFooterKind::First && tree.first_child_named(sect_pr, names::TITLE_PG).is_none() {
        let title_pg = tree.create_element(names::TITLE_PG);
        let after_title = tree.children(sect_pr).iter().copied().find(|c| {
            matches!(
                tree.name(*c),
                Some("w:textDirection") | Some("w:bidi") | Some("w:rtlGutter") | Some("w:docGrid") | Some("w:printerSettings")
            )
        });
        match after_title {
            Some(next) => tree.insert_before(next, title_pg)?,
            None => tree.append_child(sect_pr, title_pg)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::elements;

    #[test]
    fn test_kind_round_trip() {
        for kind in [HeaderFooterKind::Default, HeaderFooterKind::First, HeaderFooterKind::Even] {
            assert_eq!(HeaderFooterKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(HeaderFooterKind::parse("odd"), None);
    }

    #[test]
    fn test_set_reference_replaces_same_kind() {
        let mut tree = XmlTree::new();
        let sect_pr = elements::section_properties(&mut tree).unwrap();

        set_reference(&mut tree, sect_pr, HeaderFooterType::Header, HeaderFooterKind::Default, "rId7").unwrap();
        set_reference(&mut tree, sect_pr, HeaderFooterType::Footer, HeaderFooterKind::Default, "rId8").unwrap();
        set_reference(&mut tree, sect_pr, HeaderFooterType::Header, HeaderFooterKind::Default, "rId9").unwrap();

        assert_eq!(
            references(&tree, sect_pr, HeaderFooterType::Header),
            vec![(HeaderFooterKind::Default, "rId9".to_string())]
        );
        assert_eq!(
            references(&tree, sect_pr, HeaderFooterType::Footer),
            vec![(HeaderFooterKind::Default, "rId8".to_string())]
        );
        // references stay ahead of the page setup
        let first = tree.child_elements(sect_pr).next().unwrap();
        assert!(tree.is(first, names::HEADER_REFERENCE) || tree.is(first, names::FOOTER_REFERENCE));
        assert!(tree.first_child_named(sect_pr, names::TITLE_PG).is_none());
    }

    #[test]
    fn test_first_page_reference_sets_title_page() {
        let mut tree = XmlTree::new();
        let sect_pr = elements::section_properties(&mut tree).unwrap();

        set_reference(&mut tree, sect_pr, HeaderFooterType::Footer, HeaderFooterKind::First, "rId3").unwrap();

        assert!(tree.first_child_named(sect_pr, names::TITLE_PG).is_some());
        assert_eq!(
            references(&tree, sect_pr, HeaderFooterType::Footer),
            vec![(HeaderFooterKind::First, "rId3".to_string())]
        );
    }
}
