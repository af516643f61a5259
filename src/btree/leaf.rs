//! Leaf node operations
//!
//! Search within a leaf, in-place insertion, and the leaf split that hands
//! the new sibling to the parent (or promotes a new root).

use crate::error::{DbError, Result};
use crate::row::ROW_SIZE;

use super::layout::{leaf_left_split_count, leaf_right_split_count};
use super::node::LeafNode;
use super::tree::BTree;

impl BTree {
    /// Binary search within leaf `page_num`: the cell holding `key`, or the
    /// first cell whose key is greater (the insertion point)
    pub fn leaf_node_find(&mut self, page_num: u32, key: u32) -> Result<usize> {
        let page = self.pager_mut().get_page(page_num)?;
        LeafNode::new(&page[..]).find_cell(key)
    }

    /// Insert a cell at `cell_num`, splitting the leaf if it is full
    pub(crate) fn leaf_node_insert(
        &mut self,
        page_num: u32,
        cell_num: usize,
        key: u32,
        value: &[u8; ROW_SIZE],
    ) -> Result<()> {
        let max_cells = self.limits().leaf_max_cells;
        let page = self.pager_mut().get_page(page_num)?;
        let mut leaf = LeafNode::new(&mut page[..]);
        let num_cells = leaf.checked_num_cells()?;

        if num_cells >= max_cells {
            return self.leaf_node_split_and_insert(page_num, cell_num, key, value);
        }

        leaf.shift_cells_right(cell_num);
        leaf.write_cell(cell_num, key, value);
        leaf.set_num_cells(num_cells as u32 + 1);
        Ok(())
    }

    /// Split a full leaf around a new cell.
    ///
    /// The `max + 1` logical cells (existing plus new, in key order) are
    /// divided so the original page keeps the lower half and a new page takes
    /// the rest. The new page joins the leaf chain right after the original.
    fn leaf_node_split_and_insert(
        &mut self,
        old_page_num: u32,
        cell_num: usize,
        key: u32,
        value: &[u8; ROW_SIZE],
    ) -> Result<()> {
        let max_cells = self.limits().leaf_max_cells;
        let left_count = leaf_left_split_count(max_cells);
        let right_count = leaf_right_split_count(max_cells);

        let snapshot = Box::new(*self.pager_mut().get_page(old_page_num)?);
        let old = LeafNode::new(&snapshot[..]);
        let old_max = old
            .max_key()?
            .ok_or_else(|| DbError::Internal(format!("split of empty leaf {}", old_page_num)))?;
        let parent_num = old.parent();
        let was_root = old.is_root();

        let new_page_num = self.pager_mut().get_unused_page_num();

        {
            let page = self.pager_mut().get_page(new_page_num)?;
            let mut right = LeafNode::new(&mut page[..]);
            right.initialize();
            right.set_parent(parent_num);
            right.set_next_leaf(old.next_leaf());
            for i in left_count..=max_cells {
                let (k, v) = split_source(&old, cell_num, key, value, i);
                right.write_cell(i - left_count, k, v);
            }
            right.set_num_cells(right_count as u32);
        }

        {
            let page = self.pager_mut().get_page(old_page_num)?;
            let mut left = LeafNode::new(&mut page[..]);
            for i in 0..left_count {
                let (k, v) = split_source(&old, cell_num, key, value, i);
                left.write_cell(i, k, v);
            }
            left.set_num_cells(left_count as u32);
            left.set_next_leaf(Some(new_page_num));
        }

        tracing::trace!(
            "Split leaf {} -> {} ({} / {} cells)",
            old_page_num,
            new_page_num,
            left_count,
            right_count
        );

        if was_root {
            return self.create_new_root(new_page_num);
        }

        let new_left_max = split_source(&old, cell_num, key, value, left_count - 1).0;
        self.update_internal_node_key(parent_num, old_max, new_left_max)?;
        self.internal_node_insert(parent_num, new_page_num)
    }
}

/// Logical cell `i` of a leaf that is receiving `key` at `cell_num`
fn split_source<'a>(
    old: &'a LeafNode<&'a [u8]>,
    cell_num: usize,
    key: u32,
    value: &'a [u8],
    i: usize,
) -> (u32, &'a [u8]) {
    if i == cell_num {
        (key, value)
    } else if i > cell_num {
        (old.key(i - 1), old.value(i - 1))
    } else {
        (old.key(i), old.value(i))
    }
}
