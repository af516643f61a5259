//! Cursor
//!
//! A position in the tree: a leaf page and a cell within it. Cursors come
//! from [`BTree::start`] (first row) or [`BTree::find`] (point lookup) and
//! walk the leaf chain with [`Cursor::advance`], so a full scan never
//! revisits internal nodes.

use crate::error::{DbError, Result};
use crate::row::Row;

use super::node::LeafNode;
use super::tree::BTree;

/// Ordered position within a tree
pub struct Cursor<'t> {
    tree: &'t mut BTree,
    page_num: u32,
    cell_num: usize,
    end_of_table: bool,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(tree: &'t mut BTree, page_num: u32, cell_num: usize, end_of_table: bool) -> Self {
        Self {
            tree,
            page_num,
            cell_num,
            end_of_table,
        }
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// True once the cursor has moved past the last row
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Whether the cursor points at an existing cell
    pub fn is_on_cell(&mut self) -> Result<bool> {
        if self.end_of_table {
            return Ok(false);
        }
        let page = self.tree.pager_mut().get_page(self.page_num)?;
        Ok(self.cell_num < LeafNode::new(&page[..]).checked_num_cells()?)
    }

    /// Key at the current cell
    pub fn key(&mut self) -> Result<u32> {
        self.check_on_cell()?;
        let page = self.tree.pager_mut().get_page(self.page_num)?;
        Ok(LeafNode::new(&page[..]).key(self.cell_num))
    }

    /// Serialized row bytes at the current cell
    pub fn value(&mut self) -> Result<&[u8]> {
        self.check_on_cell()?;
        let page = self.tree.pager_mut().get_page(self.page_num)?;
        Ok(LeafNode::new(&page[..]).into_value(self.cell_num))
    }

    /// Deserialized row at the current cell
    pub fn row(&mut self) -> Result<Row> {
        Row::deserialize(self.value()?)
    }

    /// Move to the next cell, following the leaf chain at the end of a leaf.
    /// Advancing at the end of the table does nothing.
    pub fn advance(&mut self) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }

        let page = self.tree.pager_mut().get_page(self.page_num)?;
        let leaf = LeafNode::new(&page[..]);
        let num_cells = leaf.checked_num_cells()?;

        self.cell_num += 1;
        if self.cell_num >= num_cells {
            match leaf.next_leaf() {
                Some(next) => {
                    self.page_num = next;
                    self.cell_num = 0;
                }
                None => self.end_of_table = true,
            }
        }
        Ok(())
    }

    fn check_on_cell(&mut self) -> Result<()> {
        if self.is_on_cell()? {
            Ok(())
        } else {
            Err(DbError::Internal(format!(
                "cursor at page {} cell {} does not point at a row",
                self.page_num, self.cell_num
            )))
        }
    }
}

// =============================================================================
// Row Iterator
// =============================================================================

/// Lazy ascending scan over every row.
///
/// Finite, and restartable only by asking the table for a fresh scan.
pub struct Rows<'t> {
    cursor: Cursor<'t>,
    /// Error from advancing past the last returned row, reported next call
    pending: Option<DbError>,
    done: bool,
}

impl<'t> Rows<'t> {
    pub fn new(cursor: Cursor<'t>) -> Self {
        Self {
            cursor,
            pending: None,
            done: false,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            self.done = true;
            return Some(Err(e));
        }
        if self.done || self.cursor.is_end() {
            return None;
        }

        let row = match self.cursor.row() {
            Ok(row) => row,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if let Err(e) = self.cursor.advance() {
            self.pending = Some(e);
        }

        Some(Ok(row))
    }
}
