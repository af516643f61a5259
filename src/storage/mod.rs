//! Storage Module
//!
//! Page-granular access to the single backing file.
//!
//! ## Responsibilities
//! - Translate page numbers to byte buffers
//! - Lazily load pages into a bounded, never-evicting cache
//! - Hand out never-used page numbers for new nodes
//! - Write resident pages back on close
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Page 0 (4096 bytes) - always the root  │
//! ├────────────────────────────────────────┤
//! │ Page 1 (4096 bytes)                    │
//! ├────────────────────────────────────────┤
//! │ ...                                    │
//! ├────────────────────────────────────────┤
//! │ Page N-1 (4096 bytes)                  │
//! └────────────────────────────────────────┘
//! ```
//! The file length is always a multiple of `PAGE_SIZE`; anything else is
//! rejected as corruption at open time.

mod pager;

pub use pager::Pager;

/// Size of a page on disk and in the cache
pub const PAGE_SIZE: usize = 4096;

/// A single page buffer
pub type Page = [u8; PAGE_SIZE];
