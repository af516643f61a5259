//! B+tree handle
//!
//! Owns the pager and anchors every tree operation: descent, insertion and
//! root promotion. Leaf and internal node mutations live in `leaf.rs` and
//! `internal.rs` as further `impl BTree` blocks.

use crate::error::{DbError, Result};
use crate::row::ROW_SIZE;
use crate::storage::Pager;

use super::cursor::Cursor;
use super::node::{self, InternalNode, LeafNode, NodeType};

/// Split thresholds in effect for an open tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLimits {
    pub leaf_max_cells: usize,
    pub internal_max_keys: usize,
}

/// Outcome of an insert that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written
    Inserted,

    /// A row with this key already exists; nothing changed
    DuplicateKey,

    /// The split this insert requires would run past the page cache limit;
    /// nothing changed
    TableFull,
}

/// A B+tree rooted at a fixed page
pub struct BTree {
    pager: Pager,
    root_page_num: u32,
    limits: NodeLimits,
}

impl BTree {
    /// Wrap an open pager, initializing an empty root leaf for a new file.
    ///
    /// A read-only pager over an empty file has no root to read and is
    /// rejected instead.
    pub fn open(mut pager: Pager, limits: NodeLimits) -> Result<Self> {
        let root_page_num = 0;

        if pager.num_pages() == 0 && pager.is_read_only() {
            return Err(DbError::Corrupted(format!(
                "{} is empty and has no root page",
                pager.path().display()
            )));
        }

        if pager.num_pages() == 0 {
            let page = pager.get_page(root_page_num)?;
            let mut root = LeafNode::new(&mut page[..]);
            root.initialize();
            root.set_root(true);
            tracing::debug!("Initialized empty root leaf at page {}", root_page_num);
        } else {
            let page = pager.get_page(root_page_num)?;
            if !node::is_root(&page[..]) {
                return Err(DbError::Corrupted(format!(
                    "page {} is not flagged as the root",
                    root_page_num
                )));
            }
            let node_type = node::node_type(&page[..])?;
            let count = match node_type {
                NodeType::Leaf => LeafNode::new(&page[..]).checked_num_cells()?,
                NodeType::Internal => InternalNode::new(&page[..]).checked_num_keys()?,
            };
            check_limit(&limits, root_page_num, node_type, count)?;
        }

        Ok(Self {
            pager,
            root_page_num,
            limits,
        })
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Cursor at the first row in key order
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        let mut page_num = self.root_page_num;
        for _ in 0..self.depth_bound() {
            let page = self.pager.get_page(page_num)?;
            match node::node_type(&page[..])? {
                NodeType::Leaf => {
                    let num_cells = LeafNode::new(&page[..]).checked_num_cells()?;
                    return Ok(Cursor::new(self, page_num, 0, num_cells == 0));
                }
                NodeType::Internal => {
                    page_num = InternalNode::new(&page[..]).child(0)?;
                }
            }
        }
        Err(self.cycle_error())
    }

    /// Cursor at `key`, or where `key` would be inserted
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>> {
        let mut page_num = self.root_page_num;
        for _ in 0..self.depth_bound() {
            let page = self.pager.get_page(page_num)?;
            match node::node_type(&page[..])? {
                NodeType::Leaf => {
                    let cell_num = self.leaf_node_find(page_num, key)?;
                    return Ok(Cursor::new(self, page_num, cell_num, false));
                }
                NodeType::Internal => {
                    page_num = self.internal_node_find(page_num, key)?;
                }
            }
        }
        Err(self.cycle_error())
    }

    /// True maximum key of the subtree rooted at `page_num`.
    ///
    /// Internal nodes do not store the bound of their right child, so this
    /// follows right children down to a leaf.
    pub fn get_node_max_key(&mut self, page_num: u32) -> Result<u32> {
        let mut current = page_num;
        for _ in 0..self.depth_bound() {
            let page = self.pager.get_page(current)?;
            match node::node_type(&page[..])? {
                NodeType::Leaf => {
                    return LeafNode::new(&page[..]).max_key()?.ok_or_else(|| {
                        DbError::Corrupted(format!("leaf page {} has no cells", current))
                    });
                }
                NodeType::Internal => {
                    current = InternalNode::new(&page[..]).right_child();
                }
            }
        }
        Err(self.cycle_error())
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert `value` under `key`
    ///
    /// Duplicate keys, a full page cache and nodes fuller than the configured
    /// limits allow are all detected before anything is mutated.
    pub fn insert(&mut self, key: u32, value: &[u8; ROW_SIZE]) -> Result<InsertOutcome> {
        self.pager.check_writable()?;

        let (page_num, cell_num) = {
            let cursor = self.find(key)?;
            (cursor.page_num(), cursor.cell_num())
        };

        let page = self.pager.get_page(page_num)?;
        let leaf = LeafNode::new(&page[..]);
        let num_cells = leaf.checked_num_cells()?;

        if cell_num < num_cells && leaf.key(cell_num) == key {
            return Ok(InsertOutcome::DuplicateKey);
        }

        check_limit(&self.limits, page_num, NodeType::Leaf, num_cells)?;

        if num_cells == self.limits.leaf_max_cells {
            let needed = self.pages_needed_for_split(page_num)?;
            let available = self.pager.max_pages() - self.pager.get_unused_page_num();
            if needed > available {
                tracing::debug!(
                    "Insert of key {} needs {} new pages, {} available",
                    key,
                    needed,
                    available
                );
                return Ok(InsertOutcome::TableFull);
            }
        }

        self.leaf_node_insert(page_num, cell_num, key, value)?;
        Ok(InsertOutcome::Inserted)
    }

    /// Upper bound on pages a split starting at `leaf_page` can allocate:
    /// one per splitting level plus one if the root gets promoted.
    fn pages_needed_for_split(&mut self, leaf_page: u32) -> Result<u32> {
        let mut needed = 1;
        let mut page_num = leaf_page;
        for _ in 0..self.depth_bound() {
            let page = self.pager.get_page(page_num)?;
            if node::is_root(&page[..]) {
                return Ok(needed + 1);
            }
            let parent_num = node::parent(&page[..]);

            let parent = self.pager.get_page(parent_num)?;
            let num_keys = InternalNode::new(&parent[..]).checked_num_keys()?;
            check_limit(&self.limits, parent_num, NodeType::Internal, num_keys)?;
            if num_keys < self.limits.internal_max_keys {
                return Ok(needed);
            }
            needed += 1;
            page_num = parent_num;
        }
        Err(self.cycle_error())
    }

    // =========================================================================
    // Root Promotion
    // =========================================================================

    /// Grow the tree by one level.
    ///
    /// The root's content moves to a fresh left child and the root page is
    /// rewritten in place as an internal node over (left, `right_child_page`).
    pub(crate) fn create_new_root(&mut self, right_child_page: u32) -> Result<()> {
        let root_num = self.root_page_num;
        let snapshot = Box::new(*self.pager.get_page(root_num)?);
        let left_num = self.pager.get_unused_page_num();

        {
            let left = self.pager.get_page(left_num)?;
            *left = *snapshot;
            node::set_root(&mut left[..], false);
            node::set_parent(&mut left[..], root_num);
        }

        if node::node_type(&snapshot[..])? == NodeType::Internal {
            for child in InternalNode::new(&snapshot[..]).children()? {
                self.set_parent_of(child, left_num)?;
            }
        }

        let left_max = self.get_node_max_key(left_num)?;

        {
            let page = self.pager.get_page(root_num)?;
            let mut root = InternalNode::new(&mut page[..]);
            root.initialize();
            root.set_root(true);
            root.set_parent(0);
            root.fill(&[(left_num, left_max), (right_child_page, 0)])?;
        }

        self.set_parent_of(right_child_page, root_num)?;

        tracing::debug!(
            "Promoted new root: left page {} (max key {}), right page {}",
            left_num,
            left_max,
            right_child_page
        );
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    pub(crate) fn set_parent_of(&mut self, page_num: u32, parent_num: u32) -> Result<()> {
        let page = self.pager.get_page(page_num)?;
        node::set_parent(&mut page[..], parent_num);
        Ok(())
    }

    /// No root-to-leaf path can visit more nodes than there are pages
    pub(crate) fn depth_bound(&self) -> u32 {
        self.pager.num_pages().max(1)
    }

    pub(crate) fn cycle_error(&self) -> DbError {
        DbError::Corrupted(format!(
            "tree walk from page {} did not terminate within {} pages",
            self.root_page_num,
            self.pager.num_pages()
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root_page_num(&self) -> u32 {
        self.root_page_num
    }

    pub fn limits(&self) -> NodeLimits {
        self.limits
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Flush all resident pages (see [`Pager::flush_all`])
    pub fn flush(&mut self) -> Result<usize> {
        self.pager.flush_all()
    }
}

/// A node holding more entries than the configured limits was written under
/// larger limits. Splitting it under the current ones would lose entries.
pub(crate) fn check_limit(
    limits: &NodeLimits,
    page_num: u32,
    node_type: NodeType,
    count: usize,
) -> Result<()> {
    let (limit, what, name) = match node_type {
        NodeType::Leaf => (limits.leaf_max_cells, "cells", "leaf_max_cells"),
        NodeType::Internal => (limits.internal_max_keys, "keys", "internal_max_keys"),
    };
    if count > limit {
        return Err(DbError::Config(format!(
            "page {} holds {} {} but {} is {}; open the file with the node limits it was written with",
            page_num, count, what, name, limit
        )));
    }
    Ok(())
}
