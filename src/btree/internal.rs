//! Internal node operations
//!
//! Child selection during descent, child insertion, internal splits and the
//! key maintenance that keeps every stored key equal to the true maximum of
//! its subtree.

use crate::error::{DbError, Result};

use super::node::{InternalNode, NodeType};
use super::tree::{check_limit, BTree};

/// Where an internal split left the tree
enum SplitOutcome {
    /// The split node was the root; the tree grew a level
    RootPromoted,

    /// `sibling` still has to be inserted into `parent`
    Propagate { parent: u32, sibling: u32 },
}

impl BTree {
    /// Child of internal node `page_num` whose subtree may contain `key`
    pub fn internal_node_find(&mut self, page_num: u32, key: u32) -> Result<u32> {
        let page = self.pager_mut().get_page(page_num)?;
        let node = InternalNode::new(&page[..]);
        node.child(node.find_child_index(key)?)
    }

    /// Add `child_page` under `parent_page`.
    ///
    /// A full parent is split and its new sibling is pushed one level up;
    /// this repeats at most once per level of the tree.
    pub(crate) fn internal_node_insert(&mut self, parent_page: u32, child_page: u32) -> Result<()> {
        let max_keys = self.limits().internal_max_keys;
        let mut parent_num = parent_page;
        let mut child_num = child_page;

        for _ in 0..self.depth_bound() {
            let child_max = self.get_node_max_key(child_num)?;

            let (num_keys, right_child) = {
                let page = self.pager_mut().get_page(parent_num)?;
                let parent = InternalNode::new(&page[..]);
                (parent.checked_num_keys()?, parent.right_child())
            };

            check_limit(&self.limits(), parent_num, NodeType::Internal, num_keys)?;

            if num_keys < max_keys {
                let right_max = self.get_node_max_key(right_child)?;
                {
                    let page = self.pager_mut().get_page(parent_num)?;
                    let mut parent = InternalNode::new(&mut page[..]);
                    if child_max > right_max {
                        // New child becomes the right child
                        parent.write_cell(num_keys, right_child, right_max);
                        parent.set_right_child(child_num);
                    } else {
                        let index = parent.find_child_index(child_max)?;
                        parent.shift_cells_right(index);
                        parent.write_cell(index, child_num, child_max);
                    }
                    parent.set_num_keys(num_keys as u32 + 1);
                }
                return self.set_parent_of(child_num, parent_num);
            }

            match self.internal_node_split_and_insert(parent_num, child_num, child_max)? {
                SplitOutcome::RootPromoted => return Ok(()),
                SplitOutcome::Propagate { parent, sibling } => {
                    parent_num = parent;
                    child_num = sibling;
                }
            }
        }

        Err(DbError::Internal(format!(
            "split propagation from page {} exceeded the tree height",
            parent_page
        )))
    }

    /// Split full internal node `node_num` while adding `child_num`.
    ///
    /// The children (existing plus new, ordered by max key) are divided so
    /// the original page keeps the lower half and a new sibling takes the
    /// upper half.
    fn internal_node_split_and_insert(
        &mut self,
        node_num: u32,
        child_num: u32,
        child_max: u32,
    ) -> Result<SplitOutcome> {
        let snapshot = Box::new(*self.pager_mut().get_page(node_num)?);
        let old = InternalNode::new(&snapshot[..]);
        let was_root = old.is_root();
        let grandparent = old.parent();

        let num_keys = old.checked_num_keys()?;
        let mut entries = Vec::with_capacity(num_keys + 2);
        for i in 0..num_keys {
            entries.push((old.child(i)?, old.key(i)));
        }
        let old_right = old.right_child();
        let right_max = self.get_node_max_key(old_right)?;
        entries.push((old_right, right_max));

        let position = entries.partition_point(|&(_, max)| max < child_max);
        entries.insert(position, (child_num, child_max));

        // The bound the grandparent stores for this node: the largest key
        // across all children, including the one being added
        let (_, old_max) = entries[entries.len() - 1];

        let split_at = entries.len() - entries.len() / 2;
        let (left_entries, right_entries) = entries.split_at(split_at);

        let sibling = self.pager_mut().get_unused_page_num();
        {
            let page = self.pager_mut().get_page(sibling)?;
            let mut right = InternalNode::new(&mut page[..]);
            right.initialize();
            right.set_parent(grandparent);
            right.fill(right_entries)?;
        }
        {
            let page = self.pager_mut().get_page(node_num)?;
            InternalNode::new(&mut page[..]).fill(left_entries)?;
        }

        for &(child, _) in right_entries {
            self.set_parent_of(child, sibling)?;
        }
        for &(child, _) in left_entries {
            self.set_parent_of(child, node_num)?;
        }

        tracing::trace!(
            "Split internal {} -> {} ({} / {} children)",
            node_num,
            sibling,
            left_entries.len(),
            right_entries.len()
        );

        if was_root {
            self.create_new_root(sibling)?;
            return Ok(SplitOutcome::RootPromoted);
        }

        let (_, left_max) = left_entries[left_entries.len() - 1];
        self.update_internal_node_key(grandparent, old_max, left_max)?;

        Ok(SplitOutcome::Propagate {
            parent: grandparent,
            sibling,
        })
    }

    /// Replace the stored key `old_key` with `new_key` in `page_num`.
    ///
    /// If no cell holds `old_key`, the changed child is the right child,
    /// whose bound is not stored here, and nothing is written.
    pub fn update_internal_node_key(&mut self, page_num: u32, old_key: u32, new_key: u32) -> Result<()> {
        let page = self.pager_mut().get_page(page_num)?;
        let mut node = InternalNode::new(&mut page[..]);
        let index = node.find_child_index(old_key)?;
        if index < node.checked_num_keys()? && node.key(index) == old_key {
            node.set_key(index, new_key);
        }
        Ok(())
    }
}
