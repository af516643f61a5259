//! Configuration for btreedb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::btree::layout::{INTERNAL_NODE_MAX_KEYS, LEAF_NODE_MAX_CELLS};
use crate::error::{DbError, Result};

/// Default page cache ceiling (pages)
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Main configuration for a btreedb table
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing file for the table (created if missing)
    pub db_path: PathBuf,

    /// Hard ceiling on the number of pages the cache may hold.
    /// Pages are never evicted, so this also bounds the file size.
    pub max_pages: u32,

    // -------------------------------------------------------------------------
    // Node Configuration
    //
    // Limits are not stored in the file. Reopen a file with the limits it was
    // written with (or larger); a node holding more entries than the current
    // limits is refused with `DbError::Config` before anything is modified.
    // -------------------------------------------------------------------------
    /// Cells per leaf before a split (at most the layout-derived capacity)
    pub leaf_max_cells: usize,

    /// Keys per internal node before a split (at most the layout-derived capacity)
    pub internal_max_keys: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./btreedb.db"),
            max_pages: DEFAULT_MAX_PAGES,
            leaf_max_cells: LEAF_NODE_MAX_CELLS,
            internal_max_keys: INTERNAL_NODE_MAX_KEYS,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the node capacities fit the on-disk layout
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(DbError::Config("max_pages must be at least 1".to_string()));
        }
        if !(2..=LEAF_NODE_MAX_CELLS).contains(&self.leaf_max_cells) {
            return Err(DbError::Config(format!(
                "leaf_max_cells must be in 2..={}, got {}",
                LEAF_NODE_MAX_CELLS, self.leaf_max_cells
            )));
        }
        if !(2..=INTERNAL_NODE_MAX_KEYS).contains(&self.internal_max_keys) {
            return Err(DbError::Config(format!(
                "internal_max_keys must be in 2..={}, got {}",
                INTERNAL_NODE_MAX_KEYS, self.internal_max_keys
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the page cache ceiling
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.config.max_pages = pages;
        self
    }

    /// Set the leaf split threshold
    pub fn leaf_max_cells(mut self, cells: usize) -> Self {
        self.config.leaf_max_cells = cells;
        self
    }

    /// Set the internal node split threshold
    pub fn internal_max_keys(mut self, keys: usize) -> Self {
        self.config.internal_max_keys = keys;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
