//! Builders for detached WordprocessingML fragments

use crate::{names, Formatting, NodeId, Result, XmlTree};

/// Build a `w:r` carrying `text`, with optional formatting
pub fn run(tree: &mut XmlTree, text: &str, formatting: Option<&Formatting>) -> Result<NodeId> {
    let rpr = match formatting {
        Some(f) if !f.is_empty() => Some(f.to_run_properties(tree)?),
        _ => None,
    };
    run_with_properties(tree, text, rpr)
}

/// Build a `w:r` carrying `text` and an already built (detached) `w:rPr`
pub fn run_with_properties(tree: &mut XmlTree, text: &str, rpr: Option<NodeId>) -> Result<NodeId> {
    let r = tree.create_element(names::R);
    if let Some(rpr) = rpr {
        tree.append_child(r, rpr)?;
    }
    append_run_content(tree, r, text)?;
    Ok(r)
}

/// Append text to a run, turning `\t` into `w:tab` and `\n` into `w:br`
pub fn append_run_content(tree: &mut XmlTree, run: NodeId, text: &str) -> Result<()> {
    let mut pending = String::new();
    for ch in text.chars() {
        let special = match ch {
            '\t' => Some(names::TAB),
            '\n' => Some(names::BR),
            _ => None,
        };
        match special {
            Some(name) => {
                flush_text(tree, run, &mut pending)?;
                let el = tree.create_element(name);
                tree.append_child(run, el)?;
            }
            None => pending.push(ch),
        }
    }
    flush_text(tree, run, &mut pending)
}

fn flush_text(tree: &mut XmlTree, run: NodeId, pending: &mut String) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    let t = text_element(tree, pending)?;
    tree.append_child(run, t)?;
    pending.clear();
    Ok(())
}

/// Build a `w:t`, preserving leading/trailing whitespace
pub fn text_element(tree: &mut XmlTree, text: &str) -> Result<NodeId> {
    let t = tree.create_element(names::T);
    if needs_preserve(text) {
        tree.set_attribute(t, names::ATTR_XML_SPACE, "preserve")?;
    }
    tree.set_element_text(t, text)?;
    Ok(t)
}

/// Check whether text needs `xml:space="preserve"`
pub fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Build a `w:p`; an empty text produces an empty paragraph
pub fn paragraph(tree: &mut XmlTree, text: &str, formatting: Option<&Formatting>) -> Result<NodeId> {
    let p = tree.create_element(names::P);
    if !text.is_empty() {
        let r = run(tree, text, formatting)?;
        tree.append_child(p, r)?;
    }
    Ok(p)
}

/// Build a `rows x cols` table whose cells each hold one empty paragraph
pub fn table(tree: &mut XmlTree, rows: usize, cols: usize) -> Result<NodeId> {
    let tbl = tree.create_element(names::TBL);

    let tbl_pr = tree.create_element(names::TBL_PR);
    let style = tree.create_element_with(names::TBL_STYLE, &[(names::ATTR_VAL, "TableGrid")]);
    let width = tree.create_element_with(names::TBL_W, &[(names::ATTR_W, "0"), (names::ATTR_TYPE, "auto")]);
    let look = tree.create_element_with(
        names::TBL_LOOK,
        &[
            (names::ATTR_VAL, "04A0"),
            ("w:firstRow", "1"),
            ("w:lastRow", "0"),
            ("w:firstColumn", "1"),
            ("w:lastColumn", "0"),
            ("w:noHBand", "0"),
            ("w:noVBand", "1"),
        ],
    );
    for child in [style, width, look] {
        tree.append_child(tbl_pr, child)?;
    }
    tree.append_child(tbl, tbl_pr)?;

    let col_width = (9360 / cols.max(1)).to_string();
    let grid = tree.create_element(names::TBL_GRID);
    for _ in 0..cols {
        let col = tree.create_element_with(names::GRID_COL, &[(names::ATTR_W, col_width.as_str())]);
        tree.append_child(grid, col)?;
    }
    tree.append_child(tbl, grid)?;

    for _ in 0..rows {
        let tr = tree.create_element(names::TR);
        for _ in 0..cols {
            let tc = cell(tree, &col_width)?;
            tree.append_child(tr, tc)?;
        }
        tree.append_child(tbl, tr)?;
    }
    Ok(tbl)
}

/// Build a `w:tc` of the given width (twips) holding one empty paragraph
pub fn cell(tree: &mut XmlTree, width: &str) -> Result<NodeId> {
    let tc = tree.create_element(names::TC);
    let tc_pr = tree.create_element(names::TC_PR);
    let tc_w = tree.create_element_with(names::TC_W, &[(names::ATTR_W, width), (names::ATTR_TYPE, "dxa")]);
    tree.append_child(tc_pr, tc_w)?;
    tree.append_child(tc, tc_pr)?;
    let p = tree.create_element(names::P);
    tree.append_child(tc, p)?;
    Ok(tc)
}

/// Build a `w:bookmarkStart`/`w:bookmarkEnd` pair
pub fn bookmark_markers(tree: &mut XmlTree, id: u32, name: &str) -> (NodeId, NodeId) {
    let id = id.to_string();
    let start = tree.create_element_with(
        names::BOOKMARK_START,
        &[(names::ATTR_ID, id.as_str()), (names::ATTR_NAME, name)],
    );
    let end = tree.create_element_with(names::BOOKMARK_END, &[(names::ATTR_ID, id.as_str())]);
    (start, end)
}

/// Build default US Letter section properties
pub fn section_properties(tree: &mut XmlTree) -> Result<NodeId> {
    let sect_pr = tree.create_element(names::SECT_PR);
    let pg_sz = tree.create_element_with("w:pgSz", &[("w:w", "12240"), ("w:h", "15840")]);
    let pg_mar = tree.create_element_with(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    );
    let cols = tree.create_element_with("w:cols", &[("w:space", "720")]);
    for child in [pg_sz, pg_mar, cols] {
        tree.append_child(sect_pr, child)?;
    }
    Ok(sect_pr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::paragraph_text;

    #[test]
    fn test_paragraph_with_tabs_and_breaks() {
        let mut tree = XmlTree::new();
        let p = paragraph(&mut tree, "a\tb\nc", None).unwrap();

        assert_eq!(paragraph_text(&tree, p), "a\tb\nc");
        let r = tree.first_child_named(p, names::R).unwrap();
        let kinds: Vec<_> = tree.children(r).iter().filter_map(|c| tree.name(*c)).collect();
        assert_eq!(kinds, vec![names::T, names::TAB, names::T, names::BR, names::T]);
    }

    #[test]
    fn test_preserve_whitespace() {
        let mut tree = XmlTree::new();
        let t = text_element(&mut tree, "Hello ").unwrap();
        assert_eq!(tree.attribute(t, names::ATTR_XML_SPACE), Some("preserve"));

        let t = text_element(&mut tree, "Hello").unwrap();
        assert_eq!(tree.attribute(t, names::ATTR_XML_SPACE), None);
    }

    #[test]
    fn test_formatted_run() {
        let mut tree = XmlTree::new();
        let r = run(&mut tree, "bold", Some(&Formatting::new().bold(true))).unwrap();
        assert_eq!(Formatting::of_run(&tree, r).bold, Some(true));

        let plain = run(&mut tree, "plain", Some(&Formatting::new())).unwrap();
        assert!(tree.first_child_named(plain, names::R_PR).is_none());
    }

    #[test]
    fn test_table_shape() {
        let mut tree = XmlTree::new();
        let tbl = table(&mut tree, 2, 3).unwrap();

        let rows = tree.children_named(tbl, names::TR);
        assert_eq!(rows.len(), 2);
        let grid = tree.first_child_named(tbl, names::TBL_GRID).unwrap();
        assert_eq!(tree.children_named(grid, names::GRID_COL).len(), 3);
        for row in rows {
            for tc in tree.children_named(row, names::TC) {
                assert_eq!(tree.children_named(tc, names::P).len(), 1);
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_paragraph_text_matches_input(text in "[a-zA-Z \t\n]{0,40}") {
            let mut tree = XmlTree::new();
            let p = paragraph(&mut tree, &text, None).unwrap();
            proptest::prop_assert_eq!(paragraph_text(&tree, p), text);
        }
    }
}
