//! Tables, rows and cells
//!
//! Handles are thin wrappers over `w:tbl`, `w:tr` and `w:tc` nodes. Rows and
//! cells are read live from the tree on every call; a cell's paragraphs are
//! cached by the `Container` it hands out.

use crate::container::ensure_cell_ends_with_paragraph;
use crate::{Container, ContainerKind, DocumentElement, EditError, Result};
use doc_model::{elements, names, NodeId, XmlTree};

const DEFAULT_CELL_WIDTH: &str = "2000";

/// A `w:tbl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    node: NodeId,
}

/// A `w:tr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Row {
    node: NodeId,
}

/// A `w:tc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    node: NodeId,
}

impl Table {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Container over all paragraphs of the table
    pub fn container(&self) -> Container {
        Container::new(ContainerKind::Table, self.node)
    }

    pub fn rows(&self, tree: &XmlTree) -> Vec<Row> {
        tree.children_named(self.node, names::TR)
            .into_iter()
            .map(|node| Row { node })
            .collect()
    }

    pub fn row_count(&self, tree: &XmlTree) -> usize {
        self.rows(tree).len()
    }

    /// Number of grid columns, from `w:tblGrid` or else the widest row
    pub fn column_count(&self, tree: &XmlTree) -> usize {
        match tree.first_child_named(self.node, names::TBL_GRID) {
            Some(grid) if !tree.children_named(grid, names::GRID_COL).is_empty() => {
                tree.children_named(grid, names::GRID_COL).len()
            }
            _ => self
                .rows(tree)
                .iter()
                .map(|row| row.grid_width(tree))
                .max()
                .unwrap_or(0),
        }
    }

    /// Cell at a row index and grid column
    pub fn cell(&self, tree: &XmlTree, row: usize, column: usize) -> Option<Cell> {
        self.rows(tree).get(row)?.cell_at_column(tree, column)
    }

    /// Insert a row at `index` (append when None). The new row copies the
    /// last row's structure with every cell blanked.
    pub fn insert_row(&self, tree: &mut XmlTree, index: Option<usize>) -> Result<Row> {
        let rows = self.rows(tree);
        let index = index.unwrap_or(rows.len());
        if index > rows.len() {
            return Err(EditError::OutOfRange(format!(
                "row index {} outside 0..={}",
                index,
                rows.len()
            )));
        }

        let new_row = match rows.last() {
            Some(last) => {
                let copy = tree.deep_clone(last.node)?;
                for cell in tree.children_named(copy, names::TC) {
                    blank_cell(tree, cell)?;
                }
                copy
            }
            None => {
                let row = tree.create_element(names::TR);
                for _ in 0..self.column_count(tree).max(1) {
                    let cell = elements::cell(tree, DEFAULT_CELL_WIDTH)?;
                    tree.append_child(row, cell)?;
                }
                row
            }
        };

        match (rows.get(index), rows.last()) {
            (Some(at), _) => tree.insert_before(at.node, new_row)?,
            (None, Some(last)) => tree.insert_after(last.node, new_row)?,
            (None, None) => tree.append_child(self.node, new_row)?,
        }
        Ok(Row { node: new_row })
    }

    /// Remove a row; removing the last remaining row removes the table
    pub fn remove_row(&self, tree: &mut XmlTree, index: usize) -> Result<()> {
        let rows = self.rows(tree);
        let row = rows.get(index).ok_or_else(|| {
            EditError::OutOfRange(format!("row index {} outside 0..{}", index, rows.len()))
        })?;
        if rows.len() == 1 {
            return self.remove(tree);
        }
        tree.remove(row.node)?;
        Ok(())
    }

    /// Insert a grid column at `index` (append when None)
    pub fn insert_column(&self, tree: &mut XmlTree, index: Option<usize>) -> Result<()> {
        let columns = self.column_count(tree);
        let index = index.unwrap_or(columns);
        if index > columns {
            return Err(EditError::OutOfRange(format!(
                "column index {} outside 0..={}",
                index, columns
            )));
        }

        let grid = self.grid(tree)?;
        let grid_cols = tree.children_named(grid, names::GRID_COL);
        let width = grid_cols
            .get(index.min(grid_cols.len().saturating_sub(1)))
            .and_then(|col| tree.attribute(*col, names::ATTR_W))
            .unwrap_or(DEFAULT_CELL_WIDTH)
            .to_string();
        let grid_col = tree.create_element_with(names::GRID_COL, &[(names::ATTR_W, width.as_str())]);
        match grid_cols.get(index) {
            Some(at) => tree.insert_before(*at, grid_col)?,
            None => tree.append_child(grid, grid_col)?,
        }

        for row in self.rows(tree) {
            let cell = elements::cell(tree, &width)?;
            let next = row
                .grid_cells(tree)
                .into_iter()
                .find(|(_, start, _)| *start >= index)
                .map(|(cell, _, _)| cell.node);
            match (next, row.cells(tree).last()) {
                (Some(next), _) => tree.insert_before(next, cell)?,
                (None, Some(last)) => tree.insert_after(last.node, cell)?,
                (None, None) => tree.append_child(row.node, cell)?,
            }
        }
        Ok(())
    }

    /// Remove a grid column. Cells spanning it shrink; removing the last
    /// column removes the table.
    pub fn remove_column(&self, tree: &mut XmlTree, index: usize) -> Result<()> {
        let columns = self.column_count(tree);
        if index >= columns {
            return Err(EditError::OutOfRange(format!(
                "column index {} outside 0..{}",
                index, columns
            )));
        }
        if columns == 1 {
            return self.remove(tree);
        }

        for row in self.rows(tree) {
            let covering = row
                .grid_cells(tree)
                .into_iter()
                .find(|(_, start, span)| *start <= index && index < start + span);
            match covering {
                Some((cell, _, span)) if span > 1 => cell.set_grid_span(tree, span - 1)?,
                Some((cell, _, _)) => {
                    tree.remove(cell.node)?;
                    if row.cells(tree).is_empty() {
                        tree.remove(row.node)?;
                    }
                }
                None => {}
            }
        }

        if let Some(grid) = tree.first_child_named(self.node, names::TBL_GRID) {
            if let Some(col) = tree.children_named(grid, names::GRID_COL).get(index) {
                tree.remove(*col)?;
            }
        }
        if self.rows(tree).is_empty() {
            return self.remove(tree);
        }
        Ok(())
    }

    fn grid(&self, tree: &mut XmlTree) -> Result<NodeId> {
        if let Some(grid) = tree.first_child_named(self.node, names::TBL_GRID) {
            return Ok(grid);
        }
        let grid = tree.create_element(names::TBL_GRID);
        match tree.first_child_named(self.node, names::TBL_PR) {
            Some(tbl_pr) => tree.insert_after(tbl_pr, grid)?,
            None => tree.insert_child(self.node, 0, grid)?,
        }
        Ok(grid)
    }

    fn remove(&self, tree: &mut XmlTree) -> Result<()> {
        let parent = tree.parent(self.node);
        tree.remove(self.node)?;
        if let Some(cell) = parent.filter(|p| tree.is(*p, names::TC)) {
            ensure_cell_ends_with_paragraph(tree, cell)?;
        }
        Ok(())
    }
}

impl From<Table> for DocumentElement {
    fn from(table: Table) -> Self {
        DocumentElement::Table(table.node)
    }
}

impl Row {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn cells(&self, tree: &XmlTree) -> Vec<Cell> {
        tree.children_named(self.node, names::TC)
            .into_iter()
            .map(|node| Cell { node })
            .collect()
    }

    /// Cells with the grid column they start at and the columns they span
    fn grid_cells(&self, tree: &XmlTree) -> Vec<(Cell, usize, usize)> {
        let mut column = 0;
        self.cells(tree)
            .into_iter()
            .map(|cell| {
                let span = cell.grid_span(tree);
                let entry = (cell, column, span);
                column += span;
                entry
            })
            .collect()
    }

    fn grid_width(&self, tree: &XmlTree) -> usize {
        self.cells(tree).iter().map(|c| c.grid_span(tree)).sum()
    }

    /// Cell covering a grid column
    pub fn cell_at_column(&self, tree: &XmlTree, column: usize) -> Option<Cell> {
        self.grid_cells(tree)
            .into_iter()
            .find(|(_, start, span)| *start <= column && column < start + span)
            .map(|(cell, _, _)| cell)
    }
}

impl Cell {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Container over the cell's paragraphs
    pub fn container(&self) -> Container {
        Container::new(ContainerKind::Cell, self.node)
    }

    /// Number of grid columns the cell spans
    pub fn grid_span(&self, tree: &XmlTree) -> usize {
        tree.first_child_named(self.node, names::TC_PR)
            .and_then(|pr| tree.first_child_named(pr, names::GRID_SPAN))
            .and_then(|span| tree.attribute(span, names::ATTR_VAL))
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1)
    }

    fn set_grid_span(&self, tree: &mut XmlTree, span: usize) -> Result<()> {
        let span_node = tree
            .first_child_named(self.node, names::TC_PR)
            .and_then(|pr| tree.first_child_named(pr, names::GRID_SPAN));
        if let Some(node) = span_node {
            tree.set_attribute(node, names::ATTR_VAL, &span.to_string())?;
        }
        Ok(())
    }
}

/// Reduce a cell to its properties and one empty paragraph
fn blank_cell(tree: &mut XmlTree, cell: NodeId) -> Result<()> {
    for child in tree.children(cell).to_vec() {
        if !tree.is(child, names::TC_PR) {
            tree.remove(child)?;
        }
    }
    let p = tree.create_element(names::P);
    tree.append_child(cell, p)?;
    Ok(())
}

// =============================================================================
// Container operations
// =============================================================================

impl Container {
    /// Tables of the scope, excluding tables nested in other tables
    pub fn tables(&self, tree: &XmlTree) -> Vec<Table> {
        let root = self.root();
        tree.descendants_named(root, names::TBL)
            .into_iter()
            .filter(|table| {
                tree.ancestors(*table)
                    .take_while(|a| *a != root)
                    .all(|a| !tree.is(a, names::TBL) && !tree.is(a, names::MC_FALLBACK))
            })
            .map(Table::new)
            .collect()
    }

    /// Append a `rows x cols` table
    pub fn insert_table(&mut self, tree: &mut XmlTree, rows: usize, cols: usize) -> Result<Table> {
        let node = new_table(tree, rows, cols)?;
        self.append_block(tree, node)?;
        self.after_table_inserted(tree)?;
        Ok(Table::new(node))
    }

    /// Insert a `rows x cols` table at a logical offset, splitting the
    /// paragraph covering it
    pub fn insert_table_at(&mut self, tree: &mut XmlTree, index: usize, rows: usize, cols: usize) -> Result<Table> {
        self.check_insert_index(tree, index)?;
        let node = new_table(tree, rows, cols)?;
        self.insert_blocks_at(tree, index, &[node])?;
        self.after_table_inserted(tree)?;
        Ok(Table::new(node))
    }

    fn after_table_inserted(&mut self, tree: &mut XmlTree) -> Result<()> {
        if tree.is(self.root(), names::TC) {
            ensure_cell_ends_with_paragraph(tree, self.root())?;
        }
        self.clear_paragraphs_cache();
        Ok(())
    }

    /// Remove a table of this scope
    pub fn remove_table(&mut self, tree: &mut XmlTree, table: &Table) -> Result<()> {
        if !tree.is(table.node(), names::TBL) || !tree.is_descendant_of(table.node(), self.root()) {
            return Err(EditError::InvalidArgument("table is not part of this container".to_string()));
        }
        table.remove(tree)?;
        self.clear_paragraphs_cache();
        Ok(())
    }
}

fn new_table(tree: &mut XmlTree, rows: usize, cols: usize) -> Result<NodeId> {
    if rows == 0 || cols == 0 {
        return Err(EditError::InvalidArgument(format!(
            "a table needs at least one row and one column, got {}x{}",
            rows, cols
        )));
    }
    Ok(elements::table(tree, rows, cols)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with_table(tree: &mut XmlTree, rows: usize, cols: usize) -> (Container, Table) {
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        let table = container.insert_table(tree, rows, cols).unwrap();
        (container, table)
    }

    #[test]
    fn test_rows_and_columns() {
        let mut tree = XmlTree::new();
        let (_, table) = body_with_table(&mut tree, 2, 3);

        assert_eq!(table.row_count(&tree), 2);
        assert_eq!(table.column_count(&tree), 3);
        assert!(table.cell(&tree, 1, 2).is_some());
        assert!(table.cell(&tree, 2, 0).is_none());
    }

    #[test]
    fn test_insert_row_copies_structure() {
        let mut tree = XmlTree::new();
        let (_, table) = body_with_table(&mut tree, 1, 2);
        let cell = table.cell(&tree, 0, 0).unwrap();
        let mut container = cell.container();
        let p = container.paragraphs(&tree)[0].clone();
        container.insert_text(&mut tree, &p, 0, "filled", None, false).unwrap();

        let row = table.insert_row(&mut tree, Some(0)).unwrap();

        assert_eq!(table.row_count(&tree), 2);
        assert_eq!(table.rows(&tree)[0], row);
        let cells = row.cells(&tree);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].container().text(&tree), "");
        assert_eq!(table.cell(&tree, 1, 0).unwrap().container().text(&tree), "filled");
    }

    #[test]
    fn test_row_index_out_of_range() {
        let mut tree = XmlTree::new();
        let (_, table) = body_with_table(&mut tree, 2, 2);

        assert!(matches!(table.insert_row(&mut tree, Some(3)), Err(EditError::OutOfRange(_))));
        assert!(matches!(table.remove_row(&mut tree, 2), Err(EditError::OutOfRange(_))));
        assert!(matches!(table.remove_column(&mut tree, 2), Err(EditError::OutOfRange(_))));
        assert!(matches!(table.insert_column(&mut tree, Some(5)), Err(EditError::OutOfRange(_))));
    }

    #[test]
    fn test_insert_and_remove_columns() {
        let mut tree = XmlTree::new();
        let (_, table) = body_with_table(&mut tree, 2, 2);

        table.insert_column(&mut tree, Some(1)).unwrap();
        assert_eq!(table.column_count(&tree), 3);
        for row in table.rows(&tree) {
            assert_eq!(row.cells(&tree).len(), 3);
        }

        table.remove_column(&mut tree, 0).unwrap();
        assert_eq!(table.column_count(&tree), 2);
        assert_eq!(table.rows(&tree)[0].cells(&tree).len(), 2);
    }

    #[test]
    fn test_spanning_cell_shrinks() {
        let mut tree = XmlTree::new();
        let (_, table) = body_with_table(&mut tree, 1, 3);
        let row = table.rows(&tree)[0];
        // merge the first two cells into one spanning cell
        let cells = row.cells(&tree);
        tree.remove(cells[1].node()).unwrap();
        let tc_pr = tree.first_child_named(cells[0].node(), names::TC_PR).unwrap();
        let span = tree.create_element_with(names::GRID_SPAN, &[(names::ATTR_VAL, "2")]);
        tree.append_child(tc_pr, span).unwrap();

        assert_eq!(row.cell_at_column(&tree, 1), Some(cells[0]));
        table.remove_column(&mut tree, 1).unwrap();

        assert_eq!(cells[0].grid_span(&tree), 1);
        assert_eq!(row.cells(&tree).len(), 2);
    }

    #[test]
    fn test_removing_last_row_removes_table() {
        let mut tree = XmlTree::new();
        let (mut container, table) = body_with_table(&mut tree, 1, 1);

        table.remove_row(&mut tree, 0).unwrap();

        assert!(!tree.contains(table.node()));
        assert!(container.tables(&tree).is_empty());
        assert!(container.paragraphs(&tree).is_empty());
    }

    #[test]
    fn test_nested_table_in_cell() {
        let mut tree = XmlTree::new();
        let (mut body, table) = body_with_table(&mut tree, 1, 1);
        let mut cell = table.cell(&tree, 0, 0).unwrap().container();

        let nested = cell.insert_table(&mut tree, 1, 1).unwrap();

        // a cell must end with a paragraph
        let last = tree.child_elements(cell.root()).last().unwrap();
        assert!(tree.is(last, names::P));
        assert_eq!(body.tables(&tree), vec![table]);
        assert_eq!(cell.tables(&tree), vec![nested]);
        assert_eq!(body.paragraph_count(&tree), 3);

        cell.remove_table(&mut tree, &nested).unwrap();
        assert_eq!(body.paragraph_count(&tree), 2);
    }

    #[test]
    fn test_insert_table_at_splits_paragraph() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        container.insert_paragraph(&mut tree, "left right", None).unwrap();

        container.insert_table_at(&mut tree, 5, 1, 1).unwrap();

        let kinds: Vec<_> = tree.children(body).iter().filter_map(|c| tree.name(*c)).collect();
        assert_eq!(kinds, vec![names::P, names::TBL, names::P]);
        let paragraphs = container.paragraphs(&tree).to_vec();
        assert_eq!(paragraphs[0].text(&tree), "left ");
        assert_eq!(paragraphs[0].following_tables().len(), 1);
        assert_eq!(paragraphs[2].text(&tree), "right");
    }

    #[test]
    fn test_out_of_range_table_insert_builds_nothing() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        container.insert_paragraph(&mut tree, "short", None).unwrap();
        let nodes = tree.len();

        let err = container.insert_table_at(&mut tree, 40, 3, 3);

        assert!(matches!(err, Err(EditError::OutOfRange(_))));
        assert_eq!(tree.len(), nodes);
        assert!(container.tables(&tree).is_empty());
    }

    #[test]
    fn test_empty_table_rejected() {
        let mut tree = XmlTree::new();
        let body = tree.create_element(names::BODY);
        let mut container = Container::new(ContainerKind::Body, body);
        assert!(matches!(
            container.insert_table(&mut tree, 0, 3),
            Err(EditError::InvalidArgument(_))
        ));
    }
}
