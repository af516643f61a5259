//! Introspection
//!
//! Read-only views of the tree for tooling and tests: an indented tree dump,
//! the layout constants, and a full structural check.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DbError, Result};
use crate::row::ROW_SIZE;

use super::layout::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE,
    INTERNAL_NODE_MAX_KEYS, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_SPACE_FOR_CELLS,
};
use super::node::{self, InternalNode, LeafNode, NodeType};
use super::tree::{check_limit, BTree};

/// Layout sizes of this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConstants {
    pub row_size: usize,
    pub common_node_header_size: usize,
    pub leaf_node_header_size: usize,
    pub leaf_node_cell_size: usize,
    pub leaf_node_space_for_cells: usize,
    pub leaf_node_max_cells: usize,
    pub internal_node_header_size: usize,
    pub internal_node_cell_size: usize,
    pub internal_node_max_keys: usize,
}

impl LayoutConstants {
    pub const fn current() -> Self {
        Self {
            row_size: ROW_SIZE,
            common_node_header_size: COMMON_NODE_HEADER_SIZE,
            leaf_node_header_size: LEAF_NODE_HEADER_SIZE,
            leaf_node_cell_size: LEAF_NODE_CELL_SIZE,
            leaf_node_space_for_cells: LEAF_NODE_SPACE_FOR_CELLS,
            leaf_node_max_cells: LEAF_NODE_MAX_CELLS,
            internal_node_header_size: INTERNAL_NODE_HEADER_SIZE,
            internal_node_cell_size: INTERNAL_NODE_CELL_SIZE,
            internal_node_max_keys: INTERNAL_NODE_MAX_KEYS,
        }
    }
}

impl fmt::Display for LayoutConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROW_SIZE: {}", self.row_size)?;
        writeln!(f, "COMMON_NODE_HEADER_SIZE: {}", self.common_node_header_size)?;
        writeln!(f, "LEAF_NODE_HEADER_SIZE: {}", self.leaf_node_header_size)?;
        writeln!(f, "LEAF_NODE_CELL_SIZE: {}", self.leaf_node_cell_size)?;
        writeln!(f, "LEAF_NODE_SPACE_FOR_CELLS: {}", self.leaf_node_space_for_cells)?;
        writeln!(f, "LEAF_NODE_MAX_CELLS: {}", self.leaf_node_max_cells)?;
        writeln!(f, "INTERNAL_NODE_HEADER_SIZE: {}", self.internal_node_header_size)?;
        writeln!(f, "INTERNAL_NODE_CELL_SIZE: {}", self.internal_node_cell_size)?;
        write!(f, "INTERNAL_NODE_MAX_KEYS: {}", self.internal_node_max_keys)
    }
}

/// Summary returned by [`BTree::verify`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Levels from root to leaves (a lone root leaf is height 1)
    pub height: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
    pub rows: usize,
}

enum DumpItem {
    Node { page_num: u32, level: usize },
    Key { key: u32, level: usize },
}

impl BTree {
    /// Indented dump of every node, leaves listing their keys
    ///
    /// ```text
    /// - internal (size 1)
    ///   - leaf (size 2)
    ///     - 1
    ///     - 2
    ///   - key 2
    ///   - leaf (size 1)
    ///     - 3
    /// ```
    pub fn tree_dump(&mut self) -> Result<String> {
        let mut out = String::new();
        let mut stack = vec![DumpItem::Node {
            page_num: self.root_page_num(),
            level: 0,
        }];
        let mut visited = 0u32;

        while let Some(item) = stack.pop() {
            match item {
                DumpItem::Key { key, level } => {
                    push_line(&mut out, level, &format!("- key {}", key));
                }
                DumpItem::Node { page_num, level } => {
                    visited += 1;
                    if visited > self.depth_bound() {
                        return Err(self.cycle_error());
                    }

                    let page = self.pager_mut().get_page(page_num)?;
                    match node::node_type(&page[..])? {
                        NodeType::Leaf => {
                            let leaf = LeafNode::new(&page[..]);
                            let num_cells = leaf.checked_num_cells()?;
                            push_line(&mut out, level, &format!("- leaf (size {})", num_cells));
                            for i in 0..num_cells {
                                push_line(&mut out, level + 1, &format!("- {}", leaf.key(i)));
                            }
                        }
                        NodeType::Internal => {
                            let internal = InternalNode::new(&page[..]);
                            let num_keys = internal.checked_num_keys()?;
                            push_line(&mut out, level, &format!("- internal (size {})", num_keys));

                            // Pushed in reverse so children pop in key order
                            stack.push(DumpItem::Node {
                                page_num: internal.right_child(),
                                level: level + 1,
                            });
                            for i in (0..num_keys).rev() {
                                stack.push(DumpItem::Key {
                                    key: internal.key(i),
                                    level: level + 1,
                                });
                                stack.push(DumpItem::Node {
                                    page_num: internal.child(i)?,
                                    level: level + 1,
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(out)
    }

    /// Check every structural invariant of the tree
    ///
    /// - node capacities, ascending keys, no duplicates
    /// - every stored internal key equals the true max of its subtree
    /// - parent pointers and root flags
    /// - all leaves at the same depth, chained in ascending order
    pub fn verify(&mut self) -> Result<TreeStats> {
        let limits = self.limits();
        let root = self.root_page_num();
        let mut stats = TreeStats::default();

        // (page, expected parent, depth)
        let mut stack = vec![(root, None::<u32>, 1usize)];
        // Leaves in key order, as reached by the tree walk
        let mut leaves_in_order = Vec::new();
        let mut visited = BTreeSet::new();

        while let Some((page_num, expected_parent, depth)) = stack.pop() {
            if !visited.insert(page_num) {
                return Err(DbError::Corrupted(format!("page {} reached twice", page_num)));
            }

            let page = self.pager_mut().get_page(page_num)?;
            let is_root = node::is_root(&page[..]);
            if is_root != (page_num == root) {
                return Err(DbError::Corrupted(format!(
                    "page {} has root flag {}",
                    page_num, is_root
                )));
            }
            if let Some(parent) = expected_parent {
                let recorded = node::parent(&page[..]);
                if recorded != parent {
                    return Err(DbError::Corrupted(format!(
                        "page {} records parent {} but is referenced by {}",
                        page_num, recorded, parent
                    )));
                }
            }

            match node::node_type(&page[..])? {
                NodeType::Leaf => {
                    let leaf = LeafNode::new(&page[..]);
                    let num_cells = leaf.checked_num_cells()?;
                    check_limit(&limits, page_num, NodeType::Leaf, num_cells)?;
                    if num_cells == 0 && page_num != root {
                        return Err(DbError::Corrupted(format!("leaf {} is empty", page_num)));
                    }
                    for i in 1..num_cells {
                        if leaf.key(i - 1) >= leaf.key(i) {
                            return Err(DbError::Corrupted(format!(
                                "leaf {} keys out of order at cell {}",
                                page_num, i
                            )));
                        }
                    }
                    if stats.height == 0 {
                        stats.height = depth;
                    } else if stats.height != depth {
                        return Err(DbError::Corrupted(format!(
                            "leaf {} at depth {}, expected {}",
                            page_num, depth, stats.height
                        )));
                    }
                    stats.leaf_nodes += 1;
                    stats.rows += num_cells;
                    leaves_in_order.push(page_num);
                }
                NodeType::Internal => {
                    let internal = InternalNode::new(&page[..]);
                    let num_keys = internal.checked_num_keys()?;
                    check_limit(&limits, page_num, NodeType::Internal, num_keys)?;
                    let keys: Vec<u32> = (0..num_keys).map(|i| internal.key(i)).collect();
                    let children = internal.children()?;
                    stats.internal_nodes += 1;

                    for i in 1..keys.len() {
                        if keys[i - 1] >= keys[i] {
                            return Err(DbError::Corrupted(format!(
                                "internal node {} keys out of order at {}",
                                page_num, i
                            )));
                        }
                    }
                    for (i, &key) in keys.iter().enumerate() {
                        let actual = self.get_node_max_key(children[i])?;
                        if actual != key {
                            return Err(DbError::Corrupted(format!(
                                "internal node {} key {} is {} but subtree max is {}",
                                page_num, i, key, actual
                            )));
                        }
                    }
                    for &child in children.iter().rev() {
                        stack.push((child, Some(page_num), depth + 1));
                    }
                }
            }
        }

        self.verify_leaf_chain(&leaves_in_order)?;
        Ok(stats)
    }

    /// The next-leaf chain must visit exactly the leaves of the tree walk,
    /// in the same order, with strictly ascending keys throughout
    fn verify_leaf_chain(&mut self, leaves_in_order: &[u32]) -> Result<()> {
        let mut page_num = match leaves_in_order.first() {
            Some(&first) => first,
            None => return Ok(()),
        };
        let mut last_key: Option<u32> = None;

        for (i, &expected) in leaves_in_order.iter().enumerate() {
            if page_num != expected {
                return Err(DbError::Corrupted(format!(
                    "leaf chain visits page {} where the tree has page {}",
                    page_num, expected
                )));
            }

            let page = self.pager_mut().get_page(page_num)?;
            let leaf = LeafNode::new(&page[..]);
            for cell in 0..leaf.checked_num_cells()? {
                let key = leaf.key(cell);
                if last_key.is_some_and(|last| last >= key) {
                    return Err(DbError::Corrupted(format!(
                        "leaf chain not ascending at key {} (page {})",
                        key, page_num
                    )));
                }
                last_key = Some(key);
            }

            match (leaf.next_leaf(), leaves_in_order.get(i + 1)) {
                (Some(next), Some(_)) => page_num = next,
                (None, None) => {}
                (next, _) => {
                    return Err(DbError::Corrupted(format!(
                        "leaf {} links to {:?} at position {} of {}",
                        page_num,
                        next,
                        i,
                        leaves_in_order.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn push_line(out: &mut String, level: usize, text: &str) {
    for _ in 0..level {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}
