//! Tests for Cursor and the Rows iterator
//!
//! These tests verify:
//! - A cursor over an empty tree starts at the end
//! - Advancing walks every leaf through the leaf chain
//! - Point lookups land on the key or its insertion point
//! - Reading past the last row is an error, advancing past it is not

use std::path::PathBuf;

use btreedb::btree::layout::{INTERNAL_NODE_MAX_KEYS, LEAF_NODE_MAX_CELLS};
use btreedb::btree::{BTree, NodeLimits, Rows};
use btreedb::storage::Pager;
use btreedb::{DbError, Row};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_tree(keys: impl IntoIterator<Item = u32>) -> (TempDir, BTree) {
    let temp_dir = TempDir::new().unwrap();
    let path: PathBuf = temp_dir.path().join("cursor.db");
    let pager = Pager::open(&path, 100).unwrap();
    let limits = NodeLimits {
        leaf_max_cells: LEAF_NODE_MAX_CELLS,
        internal_max_keys: INTERNAL_NODE_MAX_KEYS,
    };
    let mut tree = BTree::open(pager, limits).unwrap();
    for key in keys {
        let row = Row::new(key, format!("name{}", key), format!("{}@mail.test", key)).unwrap();
        tree.insert(key, &row.to_bytes()).unwrap();
    }
    (temp_dir, tree)
}

// =============================================================================
// Start Tests
// =============================================================================

#[test]
fn test_start_on_empty_tree_is_end() {
    let (_temp, mut tree) = setup_tree(Vec::<u32>::new());
    let mut cursor = tree.start().unwrap();

    assert!(cursor.is_end());
    assert!(!cursor.is_on_cell().unwrap());
    assert!(matches!(cursor.key(), Err(DbError::Internal(_))));

    // Advancing at the end stays at the end
    cursor.advance().unwrap();
    assert!(cursor.is_end());
}

#[test]
fn test_start_points_at_smallest_key() {
    let (_temp, mut tree) = setup_tree([5, 3, 9]);
    let mut cursor = tree.start().unwrap();

    assert!(!cursor.is_end());
    assert_eq!(cursor.cell_num(), 0);
    assert_eq!(cursor.key().unwrap(), 3);
    assert_eq!(cursor.row().unwrap().username(), "name3");
}

#[test]
fn test_start_descends_to_leftmost_leaf() {
    let (_temp, mut tree) = setup_tree((1..=40).rev());
    let leftmost = {
        let cursor = tree.start().unwrap();
        cursor.page_num()
    };
    assert_ne!(leftmost, tree.root_page_num());

    let mut cursor = tree.start().unwrap();
    assert_eq!(cursor.key().unwrap(), 1);
}

// =============================================================================
// Advance Tests
// =============================================================================

#[test]
fn test_advance_crosses_leaves() {
    let (_temp, mut tree) = setup_tree(1..=30);
    let mut cursor = tree.start().unwrap();

    let mut pages = Vec::new();
    let mut keys = Vec::new();
    while !cursor.is_end() {
        if pages.last() != Some(&cursor.page_num()) {
            pages.push(cursor.page_num());
        }
        keys.push(cursor.key().unwrap());
        cursor.advance().unwrap();
    }

    assert_eq!(keys, (1..=30).collect::<Vec<_>>());
    assert_eq!(pages.len(), 4);
}

#[test]
fn test_value_is_serialized_row() {
    let (_temp, mut tree) = setup_tree([8]);
    let mut cursor = tree.start().unwrap();

    let expected = Row::new(8, "name8", "8@mail.test").unwrap().to_bytes();
    assert_eq!(cursor.value().unwrap(), &expected[..]);
}

// =============================================================================
// Find Tests
// =============================================================================

#[test]
fn test_find_existing_key() {
    let (_temp, mut tree) = setup_tree(1..=50);
    let mut cursor = tree.find(37).unwrap();

    assert!(cursor.is_on_cell().unwrap());
    assert_eq!(cursor.key().unwrap(), 37);
    assert_eq!(cursor.row().unwrap().email(), "37@mail.test");
}

#[test]
fn test_find_missing_key_gives_insertion_point() {
    let (_temp, mut tree) = setup_tree([10, 20, 30]);
    let mut cursor = tree.find(25).unwrap();

    assert_eq!(cursor.cell_num(), 2);
    assert_eq!(cursor.key().unwrap(), 30);
}

#[test]
fn test_find_past_last_key_is_off_cell() {
    let (_temp, mut tree) = setup_tree([10, 20, 30]);
    let mut cursor = tree.find(99).unwrap();

    assert_eq!(cursor.cell_num(), 3);
    assert!(!cursor.is_end());
    assert!(!cursor.is_on_cell().unwrap());
    assert!(cursor.row().is_err());
}

#[test]
fn test_find_then_advance_continues_scan() {
    let (_temp, mut tree) = setup_tree(1..=30);
    let mut cursor = tree.find(12).unwrap();

    let mut keys = Vec::new();
    while !cursor.is_end() {
        keys.push(cursor.key().unwrap());
        cursor.advance().unwrap();
    }
    assert_eq!(keys, (12..=30).collect::<Vec<_>>());
}

// =============================================================================
// Rows Iterator Tests
// =============================================================================

#[test]
fn test_rows_iterates_in_order() {
    let (_temp, mut tree) = setup_tree([4, 2, 6, 1, 5, 3]);
    let rows: Vec<Row> = Rows::new(tree.start().unwrap())
        .collect::<Result<_, _>>()
        .unwrap();

    let ids: Vec<u32> = rows.iter().map(Row::id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(rows[0], Row::new(1, "name1", "1@mail.test").unwrap());
}

#[test]
fn test_rows_on_empty_tree() {
    let (_temp, mut tree) = setup_tree(Vec::<u32>::new());
    assert_eq!(Rows::new(tree.start().unwrap()).count(), 0);
}

#[test]
fn test_rows_is_finite_after_exhaustion() {
    let (_temp, mut tree) = setup_tree(1..=3);
    let mut rows = Rows::new(tree.start().unwrap());
    assert_eq!(rows.by_ref().count(), 3);
    assert!(rows.next().is_none());
}
