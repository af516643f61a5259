//! Node views
//!
//! Typed, bounds-checked views over a page buffer. A view borrows the buffer
//! (which the pager owns) and never outlives it: `LeafNode<&[u8]>` reads,
//! `LeafNode<&mut [u8]>` reads and writes. No I/O happens here.

use crate::error::{DbError, Result};

use super::layout::{
    internal_cell_offset, leaf_cell_offset, Field, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_CHILD,
    INTERNAL_NODE_KEY, INTERNAL_NODE_MAX_KEYS, INTERNAL_NODE_NUM_KEYS, INTERNAL_NODE_RIGHT_CHILD,
    IS_ROOT, LEAF_NODE_CELL_SIZE, LEAF_NODE_KEY, LEAF_NODE_MAX_CELLS, LEAF_NODE_NEXT_LEAF,
    LEAF_NODE_NUM_CELLS, LEAF_NODE_VALUE, NODE_TYPE, NO_NEXT_LEAF, PARENT_POINTER,
};

/// Node-type tag stored in the first byte of every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeType {
    type Error = DbError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            other => Err(DbError::Corrupted(format!("unknown node type tag {}", other))),
        }
    }
}

// =============================================================================
// Common Header
// =============================================================================

pub fn node_type(buf: &[u8]) -> Result<NodeType> {
    NodeType::try_from(NODE_TYPE.read_u8(buf))
}

pub fn set_node_type(buf: &mut [u8], node_type: NodeType) {
    NODE_TYPE.write_u8(buf, node_type as u8);
}

pub fn is_root(buf: &[u8]) -> bool {
    IS_ROOT.read_u8(buf) != 0
}

pub fn set_root(buf: &mut [u8], is_root: bool) {
    IS_ROOT.write_u8(buf, is_root as u8);
}

pub fn parent(buf: &[u8]) -> u32 {
    PARENT_POINTER.read_u32(buf)
}

pub fn set_parent(buf: &mut [u8], page_num: u32) {
    PARENT_POINTER.write_u32(buf, page_num);
}

// =============================================================================
// Leaf Node
// =============================================================================

/// A page interpreted as a leaf node
pub struct LeafNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    fn cell_field(field: Field, cell_num: usize) -> Field {
        field.at(leaf_cell_offset(cell_num))
    }

    pub fn num_cells(&self) -> u32 {
        LEAF_NODE_NUM_CELLS.read_u32(self.bytes())
    }

    /// Cell count, rejected as corruption if the page cannot hold that many.
    ///
    /// Every cell index derived from an on-disk count goes through this
    /// before the cells are touched.
    pub fn checked_num_cells(&self) -> Result<usize> {
        let num_cells = self.num_cells() as usize;
        if num_cells > LEAF_NODE_MAX_CELLS {
            return Err(DbError::Corrupted(format!(
                "leaf claims {} cells, a page holds at most {}",
                num_cells, LEAF_NODE_MAX_CELLS
            )));
        }
        Ok(num_cells)
    }

    pub fn next_leaf(&self) -> Option<u32> {
        match LEAF_NODE_NEXT_LEAF.read_u32(self.bytes()) {
            NO_NEXT_LEAF => None,
            page_num => Some(page_num),
        }
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> u32 {
        parent(self.bytes())
    }

    pub fn cell(&self, cell_num: usize) -> &[u8] {
        let start = leaf_cell_offset(cell_num);
        &self.bytes()[start..start + LEAF_NODE_CELL_SIZE]
    }

    pub fn key(&self, cell_num: usize) -> u32 {
        Self::cell_field(LEAF_NODE_KEY, cell_num).read_u32(self.bytes())
    }

    pub fn value(&self, cell_num: usize) -> &[u8] {
        Self::cell_field(LEAF_NODE_VALUE, cell_num).bytes(self.bytes())
    }

    /// Key of the last cell, if any
    pub fn max_key(&self) -> Result<Option<u32>> {
        match self.checked_num_cells()? {
            0 => Ok(None),
            n => Ok(Some(self.key(n - 1))),
        }
    }

    /// Binary search: index of `key`, or the index it would be inserted at
    pub fn find_cell(&self, key: u32) -> Result<usize> {
        let mut min_index = 0usize;
        let mut one_past_max_index = self.checked_num_cells()?;
        while one_past_max_index != min_index {
            let index = (min_index + one_past_max_index) / 2;
            let key_at_index = self.key(index);
            if key == key_at_index {
                return Ok(index);
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        Ok(min_index)
    }
}

impl<'a> LeafNode<&'a [u8]> {
    /// Row bytes of `cell_num`, borrowed for as long as the page is
    pub fn into_value(self, cell_num: usize) -> &'a [u8] {
        Self::cell_field(LEAF_NODE_VALUE, cell_num).bytes(self.buf)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Reset the page to an empty, non-root leaf
    pub fn initialize(&mut self) {
        let buf = self.bytes_mut();
        set_node_type(buf, NodeType::Leaf);
        set_root(buf, false);
        LEAF_NODE_NUM_CELLS.write_u32(buf, 0);
        LEAF_NODE_NEXT_LEAF.write_u32(buf, NO_NEXT_LEAF);
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        LEAF_NODE_NUM_CELLS.write_u32(self.bytes_mut(), num_cells);
    }

    pub fn set_next_leaf(&mut self, next: Option<u32>) {
        LEAF_NODE_NEXT_LEAF.write_u32(self.bytes_mut(), next.unwrap_or(NO_NEXT_LEAF));
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        set_parent(self.bytes_mut(), page_num);
    }

    pub fn cell_mut(&mut self, cell_num: usize) -> &mut [u8] {
        let start = leaf_cell_offset(cell_num);
        &mut self.bytes_mut()[start..start + LEAF_NODE_CELL_SIZE]
    }

    pub fn set_key(&mut self, cell_num: usize, key: u32) {
        Self::cell_field(LEAF_NODE_KEY, cell_num).write_u32(self.bytes_mut(), key);
    }

    pub fn value_mut(&mut self, cell_num: usize) -> &mut [u8] {
        Self::cell_field(LEAF_NODE_VALUE, cell_num).bytes_mut(self.bytes_mut())
    }

    /// Write a whole cell (key + row bytes)
    pub fn write_cell(&mut self, cell_num: usize, key: u32, value: &[u8]) {
        self.set_key(cell_num, key);
        self.value_mut(cell_num).copy_from_slice(value);
    }

    /// Shift cells `[from, num_cells)` one slot to the right
    pub fn shift_cells_right(&mut self, from: usize) {
        let num_cells = self.num_cells() as usize;
        if from >= num_cells {
            return;
        }
        let start = leaf_cell_offset(from);
        let end = leaf_cell_offset(num_cells);
        self.bytes_mut()
            .copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
    }
}

// =============================================================================
// Internal Node
// =============================================================================

/// A page interpreted as an internal node
pub struct InternalNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    fn cell_field(field: Field, cell_num: usize) -> Field {
        field.at(internal_cell_offset(cell_num))
    }

    pub fn num_keys(&self) -> u32 {
        INTERNAL_NODE_NUM_KEYS.read_u32(self.bytes())
    }

    /// Key count, rejected as corruption if the page cannot hold that many
    pub fn checked_num_keys(&self) -> Result<usize> {
        let num_keys = self.num_keys() as usize;
        if num_keys > INTERNAL_NODE_MAX_KEYS {
            return Err(DbError::Corrupted(format!(
                "internal node claims {} keys, a page holds at most {}",
                num_keys, INTERNAL_NODE_MAX_KEYS
            )));
        }
        Ok(num_keys)
    }

    pub fn right_child(&self) -> u32 {
        INTERNAL_NODE_RIGHT_CHILD.read_u32(self.bytes())
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> u32 {
        parent(self.bytes())
    }

    /// Child `child_num`; `child_num == num_keys` is the right child
    pub fn child(&self, child_num: usize) -> Result<u32> {
        let num_keys = self.checked_num_keys()?;
        if child_num > num_keys {
            return Err(DbError::Corrupted(format!(
                "tried to access child {} of an internal node with {} keys",
                child_num, num_keys
            )));
        }
        if child_num == num_keys {
            Ok(self.right_child())
        } else {
            Ok(Self::cell_field(INTERNAL_NODE_CHILD, child_num).read_u32(self.bytes()))
        }
    }

    pub fn key(&self, key_num: usize) -> u32 {
        Self::cell_field(INTERNAL_NODE_KEY, key_num).read_u32(self.bytes())
    }

    /// All children in order, right child last
    pub fn children(&self) -> Result<Vec<u32>> {
        (0..=self.checked_num_keys()?).map(|i| self.child(i)).collect()
    }

    /// Binary search: index of the child whose key is the smallest key
    /// `>= key`, or `num_keys` (the right child) if `key` exceeds them all
    pub fn find_child_index(&self, key: u32) -> Result<usize> {
        let mut min_index = 0usize;
        let mut max_index = self.checked_num_keys()?;
        while min_index != max_index {
            let index = (min_index + max_index) / 2;
            if self.key(index) >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        Ok(min_index)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Reset the page to an empty, non-root internal node
    pub fn initialize(&mut self) {
        let buf = self.bytes_mut();
        set_node_type(buf, NodeType::Internal);
        set_root(buf, false);
        INTERNAL_NODE_NUM_KEYS.write_u32(buf, 0);
        INTERNAL_NODE_RIGHT_CHILD.write_u32(buf, 0);
    }

    pub fn set_num_keys(&mut self, num_keys: u32) {
        INTERNAL_NODE_NUM_KEYS.write_u32(self.bytes_mut(), num_keys);
    }

    pub fn set_right_child(&mut self, page_num: u32) {
        INTERNAL_NODE_RIGHT_CHILD.write_u32(self.bytes_mut(), page_num);
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        set_parent(self.bytes_mut(), page_num);
    }

    /// Set the child pointer of cell `cell_num` (not the right child)
    pub fn set_child(&mut self, cell_num: usize, page_num: u32) {
        Self::cell_field(INTERNAL_NODE_CHILD, cell_num).write_u32(self.bytes_mut(), page_num);
    }

    pub fn set_key(&mut self, key_num: usize, key: u32) {
        Self::cell_field(INTERNAL_NODE_KEY, key_num).write_u32(self.bytes_mut(), key);
    }

    pub fn write_cell(&mut self, cell_num: usize, child: u32, key: u32) {
        self.set_child(cell_num, child);
        self.set_key(cell_num, key);
    }

    /// Shift cells `[from, num_keys)` one slot to the right
    pub fn shift_cells_right(&mut self, from: usize) {
        let num_keys = self.num_keys() as usize;
        if from >= num_keys {
            return;
        }
        let start = internal_cell_offset(from);
        let end = internal_cell_offset(num_keys);
        self.bytes_mut()
            .copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);
    }

    /// Rewrite the node from an ordered list of `(child, max_key)` entries.
    /// The last entry becomes the right child; its key is not stored.
    pub fn fill(&mut self, entries: &[(u32, u32)]) -> Result<()> {
        let (&(right, _), cells) = entries.split_last().ok_or_else(|| {
            DbError::Internal("internal node must have at least one child".to_string())
        })?;
        for (i, &(child, key)) in cells.iter().enumerate() {
            self.write_cell(i, child, key);
        }
        self.set_num_keys(cells.len() as u32);
        self.set_right_child(right);
        Ok(())
    }
}
