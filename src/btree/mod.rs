//! B+tree Module
//!
//! Disk-resident B+tree over the pager's pages, keyed by `u32`.
//!
//! ## Responsibilities
//! - Interpret pages as leaf or internal nodes (pure layout, no I/O)
//! - Point search and ordered scans through a cursor
//! - Insertion with leaf/internal splits and root promotion
//!
//! ## Node Layout
//! ```text
//! Common header (6 bytes)
//! ┌──────────┬──────────┬────────────────┐
//! │ Type (1) │ Root (1) │ Parent (4)     │
//! └──────────┴──────────┴────────────────┘
//!
//! Leaf node
//! ┌────────────────┬───────────┬───────────┬──────────────────────────────┐
//! │ Common (6)     │ Cells (4) │ Next (4)  │ [Key (4) | Row (291)] × n    │
//! └────────────────┴───────────┴───────────┴──────────────────────────────┘
//!
//! Internal node
//! ┌────────────────┬───────────┬───────────┬──────────────────────────────┐
//! │ Common (6)     │ Keys (4)  │ Right (4) │ [Child (4) | Key (4)] × n    │
//! └────────────────┴───────────┴───────────┴──────────────────────────────┘
//! ```
//!
//! Key `i` of an internal node is the largest key under child `i`; the
//! right child holds everything larger. The root always lives on page 0 and
//! the tree only grows taller by rewriting that page in place.

pub mod layout;
pub mod node;

mod cursor;
mod inspect;
mod internal;
mod leaf;
mod tree;

pub use cursor::{Cursor, Rows};
pub use inspect::{LayoutConstants, TreeStats};
pub use node::{InternalNode, LeafNode, NodeType};
pub use tree::{BTree, InsertOutcome, NodeLimits};
