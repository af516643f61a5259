//! # btreedb
//!
//! A single-file, single-table persistent store with:
//! - Fixed-schema rows keyed by a `u32` id
//! - A disk-resident B+tree with leaf and internal splits
//! - A bounded, never-evicting page cache
//! - Ordered scans over a linked chain of leaves
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                              │
//! │             (insert / select / find / close)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         BTree                               │
//! │          (descent, splits, root promotion, cursor)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Node views  │          │    Pager    │
//!   │  (layout)   │          │ (page cache)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Data file  │
//!                           │(4 KiB pages)│
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod row;
pub mod storage;
pub mod btree;
pub mod table;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::Config;
pub use row::Row;
pub use table::{InsertOutcome, Table};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of btreedb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
