//! Run formatting value object
//!
//! A plain value read from and written to `w:rPr`. The engine only compares,
//! merges and applies it; every field is optional so that "not set" and
//! "explicitly off" stay distinguishable for subset matching.

use crate::{names, NodeId, Result, XmlTree};
use serde::{Deserialize, Serialize};

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlign {
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalAlign {
    fn from_val(val: &str) -> Option<Self> {
        match val {
            "baseline" => Some(Self::Baseline),
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            _ => None,
        }
    }

    fn as_val(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
        }
    }
}

/// How a run's formatting is compared against a target formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchFormattingOptions {
    /// Same set of properties with the same values
    ExactMatch,
    /// Every property set on the target is present with the same value
    #[default]
    SubsetMatch,
}

/// Character formatting of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Underline style (`single`, `double`, ...), `none` when explicitly off
    pub underline: Option<String>,
    pub strike: Option<bool>,
    pub double_strike: Option<bool>,
    pub caps: Option<bool>,
    pub small_caps: Option<bool>,
    pub hidden: Option<bool>,
    /// Font size in points
    pub size: Option<f32>,
    pub font_family: Option<String>,
    /// Hex color without `#`
    pub color: Option<String>,
    pub highlight: Option<String>,
    pub vertical_align: Option<VerticalAlign>,
    /// Character spacing in twentieths of a point
    pub spacing: Option<i32>,
    pub language: Option<String>,
    /// Character style id
    pub style: Option<String>,
}

// Toggle properties in schema order, paired with their element names
const TOGGLES: &[(&str, fn(&Formatting) -> Option<bool>)] = &[
    (names::B, |f| f.bold),
    (names::I, |f| f.italic),
    (names::CAPS, |f| f.caps),
    (names::SMALL_CAPS, |f| f.small_caps),
    (names::STRIKE, |f| f.strike),
    (names::DSTRIKE, |f| f.double_strike),
    (names::VANISH, |f| f.hidden),
];

impl Formatting {
    /// Create empty formatting
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn underline(mut self, style: impl Into<String>) -> Self {
        self.underline = Some(style.into());
        self
    }

    pub fn strike(mut self, strike: bool) -> Self {
        self.strike = Some(strike);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Set the font size in points
    pub fn size(mut self, points: f32) -> Self {
        self.size = Some(points);
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = Some(highlight.into());
        self
    }

    pub fn vertical_align(mut self, align: VerticalAlign) -> Self {
        self.vertical_align = Some(align);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn style(mut self, style_id: impl Into<String>) -> Self {
        self.style = Some(style_id.into());
        self
    }

    /// Check if no property is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge another set of properties on top of this one; properties set
    /// on `other` win
    pub fn merge(&self, other: &Formatting) -> Formatting {
        Formatting {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.clone().or_else(|| self.underline.clone()),
            strike: other.strike.or(self.strike),
            double_strike: other.double_strike.or(self.double_strike),
            caps: other.caps.or(self.caps),
            small_caps: other.small_caps.or(self.small_caps),
            hidden: other.hidden.or(self.hidden),
            size: other.size.or(self.size),
            font_family: other.font_family.clone().or_else(|| self.font_family.clone()),
            color: other.color.clone().or_else(|| self.color.clone()),
            highlight: other.highlight.clone().or_else(|| self.highlight.clone()),
            vertical_align: other.vertical_align.or(self.vertical_align),
            spacing: other.spacing.or(self.spacing),
            language: other.language.clone().or_else(|| self.language.clone()),
            style: other.style.clone().or_else(|| self.style.clone()),
        }
    }

    /// Compare this formatting (a run's) against a target
    pub fn matches(&self, target: &Formatting, mode: MatchFormattingOptions) -> bool {
        match mode {
            MatchFormattingOptions::ExactMatch => self == target,
            MatchFormattingOptions::SubsetMatch => self.contains(target),
        }
    }

    fn contains(&self, target: &Formatting) -> bool {
        fn has<T: PartialEq>(own: &Option<T>, wanted: &Option<T>) -> bool {
            wanted.is_none() || own == wanted
        }
        has(&self.bold, &target.bold)
            && has(&self.italic, &target.italic)
            && has(&self.underline, &target.underline)
            && has(&self.strike, &target.strike)
            && has(&self.double_strike, &target.double_strike)
            && has(&self.caps, &target.caps)
            && has(&self.small_caps, &target.small_caps)
            && has(&self.hidden, &target.hidden)
            && has(&self.size, &target.size)
            && has(&self.font_family, &target.font_family)
            && has(&self.color, &target.color)
            && has(&self.highlight, &target.highlight)
            && has(&self.vertical_align, &target.vertical_align)
            && has(&self.spacing, &target.spacing)
            && has(&self.language, &target.language)
            && has(&self.style, &target.style)
    }

    // =========================================================================
    // XML
    // =========================================================================

    /// Read formatting from a `w:rPr` element
    pub fn from_run_properties(tree: &XmlTree, rpr: NodeId) -> Self {
        let mut formatting = Formatting::default();
        for child in tree.children(rpr) {
            let Some(name) = tree.name(*child) else {
                continue;
            };
            let val = tree.attribute(*child, names::ATTR_VAL);
            match name {
                names::B => formatting.bold = Some(toggle(val)),
                names::I => formatting.italic = Some(toggle(val)),
                names::STRIKE => formatting.strike = Some(toggle(val)),
                names::DSTRIKE => formatting.double_strike = Some(toggle(val)),
                names::CAPS => formatting.caps = Some(toggle(val)),
                names::SMALL_CAPS => formatting.small_caps = Some(toggle(val)),
                names::VANISH => formatting.hidden = Some(toggle(val)),
                names::U => formatting.underline = val.map(str::to_string),
                names::SZ => {
                    formatting.size = val
                        .and_then(|v| v.parse::<f32>().ok())
                        .map(|half_points| half_points / 2.0)
                }
                names::R_FONTS => {
                    formatting.font_family = tree
                        .attribute(*child, names::ATTR_ASCII)
                        .or_else(|| tree.attribute(*child, names::ATTR_H_ANSI))
                        .map(str::to_string)
                }
                names::COLOR => formatting.color = val.map(str::to_string),
                names::HIGHLIGHT => formatting.highlight = val.map(str::to_string),
                names::VERT_ALIGN => formatting.vertical_align = val.and_then(VerticalAlign::from_val),
                names::SPACING => formatting.spacing = val.and_then(|v| v.parse().ok()),
                names::LANG => formatting.language = val.map(str::to_string),
                names::R_STYLE => formatting.style = val.map(str::to_string),
                _ => {}
            }
        }
        formatting
    }

    /// Read the direct formatting of a run (empty if it has no `w:rPr`)
    pub fn of_run(tree: &XmlTree, run: NodeId) -> Self {
        tree.first_child_named(run, names::R_PR)
            .map(|rpr| Self::from_run_properties(tree, rpr))
            .unwrap_or_default()
    }

    /// Build a detached `w:rPr` element in schema order
    pub fn to_run_properties(&self, tree: &mut XmlTree) -> Result<NodeId> {
        let rpr = tree.create_element(names::R_PR);

        if let Some(style) = &self.style {
            append_property(tree, rpr, names::R_STYLE, &[(names::ATTR_VAL, style.as_str())])?;
        }
        if let Some(family) = &self.font_family {
            append_property(
                tree,
                rpr,
                names::R_FONTS,
                &[
                    (names::ATTR_ASCII, family.as_str()),
                    (names::ATTR_H_ANSI, family.as_str()),
                    (names::ATTR_CS, family.as_str()),
                ],
            )?;
        }
        for (name, get) in TOGGLES {
            if let Some(on) = get(self) {
                append_property(tree, rpr, name, &toggle_attrs(on))?;
            }
        }
        if let Some(color) = &self.color {
            append_property(tree, rpr, names::COLOR, &[(names::ATTR_VAL, color.as_str())])?;
        }
        if let Some(spacing) = self.spacing {
            append_property(tree, rpr, names::SPACING, &[(names::ATTR_VAL, spacing.to_string().as_str())])?;
        }
        if let Some(size) = self.size {
            let half_points = ((size * 2.0).round() as i64).to_string();
            append_property(tree, rpr, names::SZ, &[(names::ATTR_VAL, half_points.as_str())])?;
            append_property(tree, rpr, names::SZ_CS, &[(names::ATTR_VAL, half_points.as_str())])?;
        }
        if let Some(highlight) = &self.highlight {
            append_property(tree, rpr, names::HIGHLIGHT, &[(names::ATTR_VAL, highlight.as_str())])?;
        }
        if let Some(underline) = &self.underline {
            append_property(tree, rpr, names::U, &[(names::ATTR_VAL, underline.as_str())])?;
        }
        if let Some(align) = self.vertical_align {
            append_property(tree, rpr, names::VERT_ALIGN, &[(names::ATTR_VAL, align.as_val())])?;
        }
        if let Some(language) = &self.language {
            append_property(tree, rpr, names::LANG, &[(names::ATTR_VAL, language.as_str())])?;
        }
        Ok(rpr)
    }
}

fn append_property(tree: &mut XmlTree, rpr: NodeId, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let el = tree.create_element_with(name, attrs);
    tree.append_child(rpr, el)
}

fn toggle(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

fn toggle_attrs(on: bool) -> Vec<(&'static str, &'static str)> {
    if on {
        Vec::new()
    } else {
        vec![(names::ATTR_VAL, "0")]
    }
}
