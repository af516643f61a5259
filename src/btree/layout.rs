//! Node layout schema
//!
//! Every header field and cell field is described once as a [`Field`]
//! (offset + width). Fields are chained with [`Field::after`] so each
//! node type reads as a declaration of its byte layout; all sizes below are
//! derived from these declarations.

use crate::row::ROW_SIZE;
use crate::storage::PAGE_SIZE;

/// A fixed-width field at a fixed offset within a node or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub size: usize,
}

impl Field {
    pub const fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// The field immediately following `prev`
    pub const fn after(prev: Field, size: usize) -> Self {
        Self::new(prev.end(), size)
    }

    /// One past the last byte of the field
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Shift the field by `base` bytes (cell-relative → node-relative)
    pub const fn at(&self, base: usize) -> Self {
        Self::new(base + self.offset, self.size)
    }

    pub fn read_u8(&self, buf: &[u8]) -> u8 {
        buf[self.offset]
    }

    pub fn write_u8(&self, buf: &mut [u8], value: u8) {
        buf[self.offset] = value;
    }

    pub fn read_u32(&self, buf: &[u8]) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&buf[self.offset..self.end()]);
        u32::from_le_bytes(raw)
    }

    pub fn write_u32(&self, buf: &mut [u8], value: u32) {
        buf[self.offset..self.end()].copy_from_slice(&value.to_le_bytes());
    }

    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.end()]
    }

    pub fn bytes_mut<'a>(&self, buf: &'a mut [u8]) -> &'a mut [u8] {
        &mut buf[self.offset..self.end()]
    }
}

// =============================================================================
// Common Node Header
// =============================================================================

pub const NODE_TYPE: Field = Field::new(0, 1);
pub const IS_ROOT: Field = Field::after(NODE_TYPE, 1);
pub const PARENT_POINTER: Field = Field::after(IS_ROOT, 4);
pub const COMMON_NODE_HEADER_SIZE: usize = PARENT_POINTER.end();

// =============================================================================
// Leaf Node
// =============================================================================

pub const LEAF_NODE_NUM_CELLS: Field = Field::after(PARENT_POINTER, 4);
pub const LEAF_NODE_NEXT_LEAF: Field = Field::after(LEAF_NODE_NUM_CELLS, 4);
pub const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NEXT_LEAF.end();

/// Cell-relative fields
pub const LEAF_NODE_KEY: Field = Field::new(0, 4);
pub const LEAF_NODE_VALUE: Field = Field::after(LEAF_NODE_KEY, ROW_SIZE);
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_VALUE.end();

pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Sentinel for "no next leaf". Page 0 is always the root, so it can never
/// be another leaf's successor.
pub const NO_NEXT_LEAF: u32 = 0;

// =============================================================================
// Internal Node
// =============================================================================

pub const INTERNAL_NODE_NUM_KEYS: Field = Field::after(PARENT_POINTER, 4);
pub const INTERNAL_NODE_RIGHT_CHILD: Field = Field::after(INTERNAL_NODE_NUM_KEYS, 4);
pub const INTERNAL_NODE_HEADER_SIZE: usize = INTERNAL_NODE_RIGHT_CHILD.end();

/// Cell-relative fields
pub const INTERNAL_NODE_CHILD: Field = Field::new(0, 4);
pub const INTERNAL_NODE_KEY: Field = Field::after(INTERNAL_NODE_CHILD, 4);
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_KEY.end();

pub const INTERNAL_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_MAX_KEYS: usize = INTERNAL_NODE_SPACE_FOR_CELLS / INTERNAL_NODE_CELL_SIZE;

// =============================================================================
// Split Counts
// =============================================================================

/// Cells kept by the left (original) leaf when a leaf with `max_cells` splits
pub const fn leaf_left_split_count(max_cells: usize) -> usize {
    (max_cells + 1) - leaf_right_split_count(max_cells)
}

/// Cells moved to the new right leaf when a leaf with `max_cells` splits
pub const fn leaf_right_split_count(max_cells: usize) -> usize {
    (max_cells + 1) / 2
}

/// Byte offset of leaf cell `cell_num` within a page
pub const fn leaf_cell_offset(cell_num: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
}

/// Byte offset of internal cell `cell_num` within a page
pub const fn internal_cell_offset(cell_num: usize) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
}
