//! Table Module
//!
//! The public face of the store: one table of [`Row`]s keyed by `id`,
//! backed by a single file.
//!
//! ## Responsibilities
//! - Open or create the backing file and its tree
//! - Insert rows, reporting duplicates and a full page cache as outcomes
//! - Ordered scans and point lookups
//! - Flush every resident page on close (or, best effort, on drop)
//! - Read-only access to an existing file for inspection

use std::path::Path;

use crate::btree::{BTree, NodeLimits, Rows};
use crate::config::Config;
use crate::error::Result;
use crate::row::Row;
use crate::storage::Pager;

pub use crate::btree::InsertOutcome;

/// A single-table, file-backed B+tree store
///
/// ## Lifecycle
/// - `open` loads nothing eagerly; pages are read on first access
/// - All mutations stay in memory until `close` writes them back
/// - Dropping an open table flushes it too, but errors can only be logged
/// - A table from `open_read_only` never writes; inserts fail with
///   [`DbError::ReadOnly`](crate::DbError::ReadOnly)
pub struct Table {
    tree: BTree,
    config: Config,
    closed: bool,
}

impl Table {
    /// Open or create the table described by `config`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let pager = Pager::open(&config.db_path, config.max_pages)?;
        Self::with_pager(config, pager)
    }

    /// Open an existing table file without write access
    ///
    /// The file is never created, truncated or written, including on close
    /// and drop. An empty file is reported as corrupted.
    pub fn open_read_only(config: Config) -> Result<Self> {
        config.validate()?;
        let pager = Pager::open_read_only(&config.db_path, config.max_pages)?;
        Self::with_pager(config, pager)
    }

    fn with_pager(config: Config, pager: Pager) -> Result<Self> {
        let limits = NodeLimits {
            leaf_max_cells: config.leaf_max_cells,
            internal_max_keys: config.internal_max_keys,
        };
        let tree = BTree::open(pager, limits)?;

        tracing::info!(
            "Opened table {} ({} pages{})",
            config.db_path.display(),
            tree.pager().num_pages(),
            if tree.pager().is_read_only() { ", read-only" } else { "" }
        );

        Ok(Self {
            tree,
            config,
            closed: false,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified backing file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().db_path(path).build())
    }

    /// Insert a row keyed by its id
    pub fn insert(&mut self, row: &Row) -> Result<InsertOutcome> {
        let outcome = self.tree.insert(row.id(), &row.to_bytes())?;
        match outcome {
            InsertOutcome::Inserted => tracing::trace!("Inserted row {}", row.id()),
            InsertOutcome::DuplicateKey => tracing::debug!("Duplicate key {}", row.id()),
            InsertOutcome::TableFull => tracing::warn!("Table full, rejected row {}", row.id()),
        }
        Ok(outcome)
    }

    /// Every row in ascending id order
    pub fn select(&mut self) -> Result<Rows<'_>> {
        Ok(Rows::new(self.tree.start()?))
    }

    /// The row with `id`, if present
    pub fn find(&mut self, id: u32) -> Result<Option<Row>> {
        let mut cursor = self.tree.find(id)?;
        if cursor.is_on_cell()? && cursor.key()? == id {
            cursor.row().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Indented dump of the tree structure
    pub fn tree_dump(&mut self) -> Result<String> {
        self.tree.tree_dump()
    }

    /// Flush all pages and close the file
    pub fn close(mut self) -> Result<()> {
        let flushed = if self.is_read_only() {
            0
        } else {
            self.tree.flush()?
        };
        self.closed = true;
        tracing::info!(
            "Closed table {} ({} pages written)",
            self.config.db_path.display(),
            flushed
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_read_only(&self) -> bool {
        self.tree.pager().is_read_only()
    }

    pub fn tree(&self) -> &BTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BTree {
        &mut self.tree
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.closed || self.is_read_only() {
            return;
        }
        if let Err(e) = self.tree.flush() {
            tracing::error!(
                "Failed to flush table {} on drop: {}",
                self.config.db_path.display(),
                e
            );
        }
    }
}
