//! Find and Replace Engine
//!
//! This module provides formatting-aware search and replace over a container:
//! - RegexOptions for configuring how the search pattern is compiled
//! - ReplaceOptions shared by every replace variant
//! - StringReplaceTextOptions, FunctionReplaceTextOptions and
//!   ObjectReplaceTextOptions, the three ways of producing a replacement
//! - the driver, `Container::replace_text`
//!
//! Matching runs on the flattened text of one paragraph at a time, so a match
//! may straddle any number of runs. The walk is not transactional: an error
//! halfway leaves the paragraphs already processed modified.

use crate::container::{blank_paragraph, ensure_cell_ends_with_paragraph};
use crate::splitter::split_paragraph;
use crate::{revision, run_edit, Container, EditError, Paragraph, Result, RevisionIds, RevisionInfo};
use doc_model::{names, text, Formatting, MatchFormattingOptions, NodeId, XmlTree};
use regex_lite::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Flags used when compiling a search pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexOptions {
    /// Match letters regardless of case
    pub case_insensitive: bool,
    /// `^` and `$` match at line breaks
    pub multi_line: bool,
    /// `.` also matches `\n`
    pub dot_matches_new_line: bool,
    /// Whitespace and `#` comments in the pattern are ignored
    pub ignore_whitespace: bool,
}

impl RegexOptions {
    /// No flags set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case-insensitive matching
    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    /// Let `^` and `$` match at line breaks
    pub fn multi_line(mut self, value: bool) -> Self {
        self.multi_line = value;
        self
    }

    /// Let `.` match `\n`
    pub fn dot_matches_new_line(mut self, value: bool) -> Self {
        self.dot_matches_new_line = value;
        self
    }

    /// Allow whitespace and `#` comments in the pattern
    pub fn ignore_whitespace(mut self, value: bool) -> Self {
        self.ignore_whitespace = value;
        self
    }

    /// Compile a pattern with these flags
    pub fn build(&self, pattern: &str) -> Result<Regex> {
        Ok(RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .build()?)
    }
}

/// Options common to every replace variant
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOptions {
    /// Text or pattern to search for
    pub search_value: String,
    pub regex_options: RegexOptions,
    /// Treat the search value as literal text
    pub escape_regex: bool,
    /// First logical offset a match may start at
    pub start_index: Option<usize>,
    /// Logical offset a match must end at or before
    pub end_index: Option<usize>,
    /// Only replace text whose runs carry this formatting
    pub formatting_to_match: Option<Formatting>,
    pub match_formatting: MatchFormattingOptions,
    /// Formatting of the replacement text; None keeps the replaced run's
    pub new_formatting: Option<Formatting>,
    pub stop_after_one_replacement: bool,
    /// Remove paragraphs a replacement left empty
    pub remove_empty_paragraph: bool,
    /// Record replacements as tracked changes
    pub track_changes: bool,
}

impl ReplaceOptions {
    /// Options searching for `search_value`, literally when `escape_regex`
    pub fn new(search_value: impl Into<String>, escape_regex: bool) -> Self {
        Self {
            search_value: search_value.into(),
            regex_options: RegexOptions::default(),
            escape_regex,
            start_index: None,
            end_index: None,
            formatting_to_match: None,
            match_formatting: MatchFormattingOptions::default(),
            new_formatting: None,
            stop_after_one_replacement: false,
            remove_empty_paragraph: true,
            track_changes: false,
        }
    }

    /// Reject malformed options before anything is touched
    pub fn validate(&self) -> Result<()> {
        if self.search_value.is_empty() {
            return Err(EditError::InvalidArgument("search value must not be empty".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start_index, self.end_index) {
            if start >= end {
                return Err(EditError::OutOfRange(format!(
                    "start index {} must be lower than end index {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Compile the search value
    pub fn regex(&self) -> Result<Regex> {
        if self.escape_regex {
            self.regex_options.build(&regex_lite::escape(&self.search_value))
        } else {
            self.regex_options.build(&self.search_value)
        }
    }

    fn in_range(&self, start: usize, end: usize) -> bool {
        self.start_index.map_or(true, |limit| limit <= start) && self.end_index.map_or(true, |limit| end <= limit)
    }
}

/// What a match is replaced with
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Text(String),
    /// Detached block elements spliced in place of the match
    Elements(Vec<NodeId>),
}

/// Pre-built block content for object replacement. The nodes are detached
/// templates; every match receives its own copy.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentElement {
    Paragraph(NodeId),
    Table(NodeId),
    List(Vec<NodeId>),
}

impl DocumentElement {
    fn nodes(&self) -> Vec<NodeId> {
        match self {
            DocumentElement::Paragraph(node) | DocumentElement::Table(node) => vec![*node],
            DocumentElement::List(items) => items.clone(),
        }
    }

    fn expected_name(&self) -> &'static str {
        match self {
            DocumentElement::Paragraph(_) | DocumentElement::List(_) => names::P,
            DocumentElement::Table(_) => names::TBL,
        }
    }
}

/// A way of replacing matched text
pub trait ReplaceTextOptions {
    /// The shared options
    fn options(&self) -> &ReplaceOptions;

    /// Reject malformed options before anything is touched
    fn validate(&self, _tree: &XmlTree) -> Result<()> {
        self.options().validate()
    }

    /// Replacement for one match
    fn replacement(&self, tree: &mut XmlTree, captures: &Captures<'_>) -> Result<Replacement>;
}

macro_rules! replace_option_builders {
    ($options:ty) => {
        impl $options {
            /// Set the flags the search pattern is compiled with
            pub fn regex_options(mut self, regex_options: RegexOptions) -> Self {
                self.options.regex_options = regex_options;
                self
            }

            /// Treat the search value as literal text rather than a pattern
            pub fn escape_regex(mut self, value: bool) -> Self {
                self.options.escape_regex = value;
                self
            }

            /// Only accept matches inside `[start, end]` logical offsets
            pub fn range(mut self, start: usize, end: usize) -> Self {
                self.options.start_index = Some(start);
                self.options.end_index = Some(end);
                self
            }

            /// Only accept matches whose runs carry `formatting`, compared
            /// according to `mode`
            pub fn formatting_to_match(mut self, formatting: Formatting, mode: MatchFormattingOptions) -> Self {
                self.options.formatting_to_match = Some(formatting);
                self.options.match_formatting = mode;
                self
            }

            /// Write replacement text with exactly this formatting
            pub fn new_formatting(mut self, formatting: Formatting) -> Self {
                self.options.new_formatting = Some(formatting);
                self
            }

            /// Stop after the first replaced match
            pub fn stop_after_one_replacement(mut self, value: bool) -> Self {
                self.options.stop_after_one_replacement = value;
                self
            }

            /// Remove paragraphs the replacement leaves without text
            pub fn remove_empty_paragraph(mut self, value: bool) -> Self {
                self.options.remove_empty_paragraph = value;
                self
            }

            /// Record the replacement as tracked insertions and deletions
            pub fn track_changes(mut self, value: bool) -> Self {
                self.options.track_changes = value;
                self
            }
        }
    };
}

/// Replace matches with a fixed string
#[derive(Debug, Clone, PartialEq)]
pub struct StringReplaceTextOptions {
    pub options: ReplaceOptions,
    pub new_value: String,
    /// Expand `$1`/`${name}` group references in `new_value`
    pub use_regex_substitution: bool,
}

impl StringReplaceTextOptions {
    /// Literal search for `search_value`
    pub fn new(search_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            options: ReplaceOptions::new(search_value, true),
            new_value: new_value.into(),
            use_regex_substitution: false,
        }
    }

    /// Expand group references in the new value
    pub fn use_regex_substitution(mut self, value: bool) -> Self {
        self.use_regex_substitution = value;
        self
    }
}

replace_option_builders!(StringReplaceTextOptions);

impl ReplaceTextOptions for StringReplaceTextOptions {
    fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    fn replacement(&self, _tree: &mut XmlTree, captures: &Captures<'_>) -> Result<Replacement> {
        if !self.use_regex_substitution {
            return Ok(Replacement::Text(self.new_value.clone()));
        }
        let mut expanded = String::new();
        captures.expand(&self.new_value, &mut expanded);
        Ok(Replacement::Text(expanded))
    }
}

/// Replace each match with the result of a function of the matched text
pub struct FunctionReplaceTextOptions {
    pub options: ReplaceOptions,
    handler: Box<dyn Fn(&str) -> String>,
}

impl FunctionReplaceTextOptions {
    /// Regex search for `pattern`
    pub fn new(pattern: impl Into<String>, handler: impl Fn(&str) -> String + 'static) -> Self {
        Self {
            options: ReplaceOptions::new(pattern, false),
            handler: Box::new(handler),
        }
    }
}

replace_option_builders!(FunctionReplaceTextOptions);

impl ReplaceTextOptions for FunctionReplaceTextOptions {
    fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    fn replacement(&self, _tree: &mut XmlTree, captures: &Captures<'_>) -> Result<Replacement> {
        let matched = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
        Ok(Replacement::Text((self.handler)(matched)))
    }
}

/// Replace each match with a copy of a block element
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectReplaceTextOptions {
    pub options: ReplaceOptions,
    pub object: DocumentElement,
}

impl ObjectReplaceTextOptions {
    /// Literal search for `search_value`
    pub fn new(search_value: impl Into<String>, object: DocumentElement) -> Self {
        Self {
            options: ReplaceOptions::new(search_value, true),
            object,
        }
    }
}

replace_option_builders!(ObjectReplaceTextOptions);

impl ReplaceTextOptions for ObjectReplaceTextOptions {
    fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    fn validate(&self, tree: &XmlTree) -> Result<()> {
        self.options.validate()?;
        let nodes = self.object.nodes();
        if nodes.is_empty() {
            return Err(EditError::InvalidArgument("replacement object has no content".to_string()));
        }
        let expected = self.object.expected_name();
        if let Some(bad) = nodes.iter().find(|n| !tree.is(**n, expected)) {
            return Err(EditError::InvalidArgument(format!(
                "replacement node {} is not a {} element",
                bad, expected
            )));
        }
        Ok(())
    }

    fn replacement(&self, tree: &mut XmlTree, _captures: &Captures<'_>) -> Result<Replacement> {
        let copies = self
            .object
            .nodes()
            .into_iter()
            .map(|node| tree.deep_clone(node))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Replacement::Elements(copies))
    }
}

// =============================================================================
// Driver
// =============================================================================

/// An accepted match: character range in its paragraph plus replacement
struct AcceptedMatch {
    start: usize,
    end: usize,
    replacement: Replacement,
}

impl Container {
    /// Replace text in every paragraph of the container. Returns whether at
    /// least one replacement was made; no match is not an error.
    pub fn replace_text<O: ReplaceTextOptions + ?Sized>(&mut self, tree: &mut XmlTree, options: &O) -> Result<bool> {
        options.validate(tree)?;
        let regex = options.options().regex()?;

        self.refresh_paragraph_indexes(tree);
        let snapshot = self.paragraphs(tree).to_vec();

        self.set_prevent_update_paragraph_indexes(true);
        let outcome = self.replace_in_paragraphs(tree, &snapshot, options, &regex);
        self.set_prevent_update_paragraph_indexes(false);
        self.mark_paragraph_indexes_stale();

        let replaced = outcome?;
        debug!(kind = ?self.kind(), replaced, "replace_text finished");
        Ok(replaced)
    }

    fn replace_in_paragraphs<O: ReplaceTextOptions + ?Sized>(
        &mut self,
        tree: &mut XmlTree,
        paragraphs: &[Paragraph],
        options: &O,
        regex: &Regex,
    ) -> Result<bool> {
        let common = options.options();
        let revision = self.revision(common.track_changes);
        let mut replaced = false;
        let mut emptied = Vec::new();

        for paragraph in paragraphs {
            if common.start_index.is_some_and(|start| paragraph.end_index < start) {
                continue;
            }
            if common.end_index.is_some_and(|end| paragraph.start_index > end) {
                break;
            }
            if !tree.contains(paragraph.node()) {
                continue;
            }

            let had_text = paragraph.text_length(tree) > 0;
            let matches = collect_matches(tree, paragraph, options, regex)?;
            if matches.is_empty() {
                continue;
            }
            trace!(matches = matches.len(), start = paragraph.start_index, "replacing in paragraph");
            let host = apply_matches(tree, paragraph.node(), matches, common.new_formatting.as_ref(), revision.as_ref())?;
            replaced = true;

            if had_text && tree.contains(host) && text::text_length(tree, host) == 0 {
                emptied.push(host);
            }
            if common.stop_after_one_replacement {
                break;
            }
        }

        if common.remove_empty_paragraph {
            for node in emptied {
                remove_emptied_paragraph(tree, node, revision.as_ref())?;
            }
        }
        if replaced {
            self.clear_paragraphs_cache();
        }
        Ok(replaced)
    }
}

/// Accepted matches of one paragraph, leftmost first
fn collect_matches<O: ReplaceTextOptions + ?Sized>(
    tree: &mut XmlTree,
    paragraph: &Paragraph,
    options: &O,
    regex: &Regex,
) -> Result<Vec<AcceptedMatch>> {
    let common = options.options();
    let content = paragraph.text(tree);
    let spans = text::run_spans(tree, paragraph.node());
    let mut accepted = Vec::new();

    for captures in regex.captures_iter(&content) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.as_str().is_empty() {
            continue;
        }
        let start = text::char_offset(&content, whole.start());
        let end = text::char_offset(&content, whole.end());
        if !common.in_range(paragraph.start_index + start, paragraph.start_index + end) {
            continue;
        }
        if let Some(target) = &common.formatting_to_match {
            let formatted = spans
                .iter()
                .filter(|span| !span.is_empty() && span.overlaps(start, end))
                .all(|span| Formatting::of_run(tree, span.run).matches(target, common.match_formatting));
            if !formatted {
                continue;
            }
        }

        let replacement = options.replacement(tree, &captures)?;
        accepted.push(AcceptedMatch { start, end, replacement });
        if common.stop_after_one_replacement {
            break;
        }
    }
    Ok(accepted)
}

/// Apply matches right to left so earlier offsets stay valid. Returns the
/// paragraph now holding the text before the first match.
fn apply_matches(
    tree: &mut XmlTree,
    paragraph: NodeId,
    matches: Vec<AcceptedMatch>,
    formatting: Option<&Formatting>,
    revision: Option<&RevisionInfo>,
) -> Result<NodeId> {
    let mut host = paragraph;
    for accepted in matches.into_iter().rev() {
        match accepted.replacement {
            Replacement::Text(replacement) => {
                run_edit::replace_range(tree, host, accepted.start, accepted.end, &replacement, formatting, revision)?;
            }
            Replacement::Elements(blocks) => {
                host = splice_blocks(tree, host, accepted.start, accepted.end, &blocks, revision)?;
            }
        }
    }
    Ok(host)
}

/// Delete `[start, end)` of a paragraph and put block elements there,
/// splitting the paragraph around them. Halves left without content are
/// dropped unless the paragraph has to survive (section break, last
/// paragraph of a cell).
fn splice_blocks(
    tree: &mut XmlTree,
    paragraph: NodeId,
    start: usize,
    end: usize,
    blocks: &[NodeId],
    revision: Option<&RevisionInfo>,
) -> Result<NodeId> {
    run_edit::replace_range(tree, paragraph, start, end, "", None, revision)?;
    let split = split_paragraph(tree, paragraph, start)?;

    let ends_cell = tree.parent(paragraph).is_some_and(|parent| tree.is(parent, names::TC))
        && tree.next_sibling(paragraph).is_none();
    let keep_before = has_content(tree, split.before);
    let keep_after = has_content(tree, split.after) || has_section_break(tree, split.after) || ends_cell;

    let mut sequence = Vec::with_capacity(blocks.len() + 2);
    if keep_before {
        sequence.push(split.before);
    }
    sequence.extend_from_slice(blocks);
    if keep_after {
        sequence.push(split.after);
    }
    tree.replace_with(paragraph, &sequence)?;

    if !keep_before {
        tree.remove(split.before)?;
    }
    if !keep_after {
        tree.remove(split.after)?;
    }
    Ok(split.before)
}

fn has_content(tree: &XmlTree, paragraph: NodeId) -> bool {
    text::text_length(tree, paragraph) > 0
        || tree.descendants(paragraph).into_iter().any(|d| {
            matches!(
                tree.name(d),
                Some(names::DEL) | Some(names::INS) | Some(names::BOOKMARK_START) | Some(names::BOOKMARK_END)
            )
        })
}

fn has_section_break(tree: &XmlTree, paragraph: NodeId) -> bool {
    tree.first_child_named(paragraph, names::P_PR)
        .is_some_and(|ppr| tree.first_child_named(ppr, names::SECT_PR).is_some())
}

fn remove_emptied_paragraph(tree: &mut XmlTree, node: NodeId, revision: Option<&RevisionInfo>) -> Result<()> {
    if !tree.contains(node) || has_section_break(tree, node) {
        return Ok(());
    }
    if let Some(info) = revision {
        let mut ids = RevisionIds::for_node(tree, node);
        return revision::mark_paragraph_mark_deleted(tree, node, info, &mut ids);
    }
    let parent = tree.parent(node);
    if let Some(cell) = parent.filter(|p| tree.is(*p, names::TC)) {
        if tree.children_named(cell, names::P).len() == 1 {
            return blank_paragraph(tree, node);
        }
    }
    tree.remove(node)?;
    if let Some(cell) = parent.filter(|p| tree.is(*p, names::TC)) {
        ensure_cell_ends_with_paragraph(tree, cell)?;
    }
    Ok(())
}
