//! Tests for Table
//!
//! These tests verify:
//! - Opening with default and custom configuration
//! - Insert outcomes (inserted, duplicate, table full)
//! - Ordered select and point find
//! - Close and drop both persist every page
//! - Invalid configuration is rejected before touching the file
//! - Read-only tables never create or modify the file
//! - Node limits smaller than the file was written with are refused

use std::fs;
use std::path::{Path, PathBuf};

use btreedb::{Config, DbError, InsertOutcome, Row, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.db");
    (temp_dir, path)
}

fn row(id: u32) -> Row {
    Row::new(id, format!("user{}", id), format!("user{}@example.com", id)).unwrap()
}

/// Write rows `ids` with the default configuration and close the table
fn setup_table_file(path: &Path, ids: impl IntoIterator<Item = u32>) {
    let mut table = Table::open_path(path).unwrap();
    for id in ids {
        table.insert(&row(id)).unwrap();
    }
    table.close().unwrap();
}

fn select_ids(table: &mut Table) -> Vec<u32> {
    table
        .select()
        .unwrap()
        .map(|row| row.unwrap().id())
        .collect()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_path_uses_defaults() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();

    assert_eq!(table.config().db_path, path);
    assert_eq!(table.config().max_pages, 100);
    assert_eq!(table.config().leaf_max_cells, 13);
    assert!(select_ids(&mut table).is_empty());
}

#[test]
fn test_open_rejects_invalid_config() {
    let (_temp, path) = setup_temp_path();

    let config = Config::builder().db_path(&path).leaf_max_cells(14).build();
    assert!(matches!(Table::open(config), Err(DbError::Config(_))));

    let config = Config::builder().db_path(&path).internal_max_keys(1).build();
    assert!(matches!(Table::open(config), Err(DbError::Config(_))));

    let config = Config::builder().db_path(&path).max_pages(0).build();
    assert!(matches!(Table::open(config), Err(DbError::Config(_))));

    assert!(!path.exists());
}

// =============================================================================
// Insert / Select Tests
// =============================================================================

#[test]
fn test_insert_out_of_order_selects_sorted() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();

    for id in [3, 1, 2] {
        assert_eq!(table.insert(&row(id)).unwrap(), InsertOutcome::Inserted);
    }

    let rows: Vec<Row> = table.select().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(rows, vec![row(1), row(2), row(3)]);
}

#[test]
fn test_duplicate_insert() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();

    assert_eq!(table.insert(&row(1)).unwrap(), InsertOutcome::Inserted);
    let dup = Row::new(1, "other", "other@example.com").unwrap();
    assert_eq!(table.insert(&dup).unwrap(), InsertOutcome::DuplicateKey);

    let rows: Vec<Row> = table.select().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(rows, vec![row(1)]);
}

#[test]
fn test_table_full_outcome() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().db_path(&path).max_pages(1).build();
    let mut table = Table::open(config).unwrap();

    for id in 1..=13 {
        assert_eq!(table.insert(&row(id)).unwrap(), InsertOutcome::Inserted);
    }
    assert_eq!(table.insert(&row(14)).unwrap(), InsertOutcome::TableFull);
    assert_eq!(select_ids(&mut table), (1..=13).collect::<Vec<_>>());
}

#[test]
fn test_find() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();

    for id in (2..=60).step_by(2) {
        table.insert(&row(id)).unwrap();
    }

    assert_eq!(table.find(30).unwrap(), Some(row(30)));
    assert_eq!(table.find(2).unwrap(), Some(row(2)));
    assert_eq!(table.find(60).unwrap(), Some(row(60)));
    assert_eq!(table.find(31).unwrap(), None);
    assert_eq!(table.find(1).unwrap(), None);
    assert_eq!(table.find(61).unwrap(), None);
}

#[test]
fn test_find_on_empty_table() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();
    assert_eq!(table.find(1).unwrap(), None);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_close_and_reopen() {
    let (_temp, path) = setup_temp_path();

    let before = {
        let mut table = Table::open_path(&path).unwrap();
        for id in (1..=100).rev() {
            table.insert(&row(id)).unwrap();
        }
        let ids = select_ids(&mut table);
        table.close().unwrap();
        ids
    };

    let mut table = Table::open_path(&path).unwrap();
    assert_eq!(select_ids(&mut table), before);
    assert_eq!(table.find(57).unwrap(), Some(row(57)));
    table.tree_mut().verify().unwrap();
}

#[test]
fn test_drop_flushes() {
    let (_temp, path) = setup_temp_path();

    {
        let mut table = Table::open_path(&path).unwrap();
        for id in 1..=20 {
            table.insert(&row(id)).unwrap();
        }
        // Dropped without close
    }

    let mut table = Table::open_path(&path).unwrap();
    assert_eq!(select_ids(&mut table), (1..=20).collect::<Vec<_>>());
}

#[test]
fn test_reopen_with_small_nodes() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder()
        .db_path(&path)
        .max_pages(1000)
        .leaf_max_cells(3)
        .internal_max_keys(3)
        .build();

    {
        let mut table = Table::open(config.clone()).unwrap();
        for id in 1..=200 {
            table.insert(&row(id * 3 % 200 + 1)).unwrap();
        }
        table.close().unwrap();
    }

    let mut table = Table::open(config).unwrap();
    assert_eq!(select_ids(&mut table), (1..=200).collect::<Vec<_>>());
    let stats = table.tree_mut().verify().unwrap();
    assert_eq!(stats.rows, 200);
}

#[test]
fn test_file_is_whole_pages_after_close() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();
    for id in 1..=14 {
        table.insert(&row(id)).unwrap();
    }
    table.close().unwrap();

    // Root plus two leaves
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 3 * 4096);
}

#[test]
fn test_tree_dump_single_leaf() {
    let (_temp, path) = setup_temp_path();
    let mut table = Table::open_path(&path).unwrap();
    for id in [2, 1] {
        table.insert(&row(id)).unwrap();
    }
    assert_eq!(table.tree_dump().unwrap(), "- leaf (size 2)\n  - 1\n  - 2\n");
}

// =============================================================================
// Read-Only Tests
// =============================================================================

#[test]
fn test_read_only_open_leaves_file_untouched() {
    let (_temp, path) = setup_temp_path();
    setup_table_file(&path, (1..=100).rev());
    let before = fs::read(&path).unwrap();

    let config = Config::builder().db_path(&path).build();
    let mut table = Table::open_read_only(config.clone()).unwrap();
    assert!(table.is_read_only());
    assert_eq!(select_ids(&mut table), (1..=100).collect::<Vec<_>>());
    assert_eq!(table.find(42).unwrap(), Some(row(42)));
    table.tree_dump().unwrap();
    assert_eq!(table.tree_mut().verify().unwrap().rows, 100);
    assert!(matches!(
        table.insert(&row(101)),
        Err(DbError::ReadOnly(_))
    ));
    table.close().unwrap();

    // Dropped without close
    {
        let mut table = Table::open_read_only(config).unwrap();
        select_ids(&mut table);
    }

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_read_only_open_of_empty_file_is_corrupted() {
    let (_temp, path) = setup_temp_path();
    fs::write(&path, b"").unwrap();

    let config = Config::builder().db_path(&path).build();
    assert!(matches!(
        Table::open_read_only(config),
        Err(DbError::Corrupted(_))
    ));
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_read_only_open_does_not_create_file() {
    let (_temp, path) = setup_temp_path();

    let config = Config::builder().db_path(&path).build();
    assert!(matches!(Table::open_read_only(config), Err(DbError::Io(_))));
    assert!(!path.exists());
}

#[test]
fn test_read_only_open_of_write_protected_file() {
    let (_temp, path) = setup_temp_path();
    setup_table_file(&path, 1..=5);

    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&path, permissions.clone()).unwrap();

    {
        let config = Config::builder().db_path(&path).build();
        let mut table = Table::open_read_only(config).unwrap();
        assert_eq!(select_ids(&mut table), (1..=5).collect::<Vec<_>>());
        table.close().unwrap();
    }

    permissions.set_readonly(false);
    fs::set_permissions(&path, permissions).unwrap();
}

// =============================================================================
// Node Limit Tests
// =============================================================================

#[test]
fn test_open_with_smaller_leaf_limit_than_file_rejected() {
    let (_temp, path) = setup_temp_path();
    setup_table_file(&path, 1..=13);
    let before = fs::read(&path).unwrap();

    let config = Config::builder().db_path(&path).leaf_max_cells(4).build();
    assert!(matches!(Table::open(config), Err(DbError::Config(_))));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_insert_into_leaf_fuller_than_limit_rejected() {
    let (_temp, path) = setup_temp_path();
    // Leaves of 7 and 13 rows under an internal root
    setup_table_file(&path, 1..=20);

    {
        let config = Config::builder().db_path(&path).leaf_max_cells(4).build();
        let mut table = Table::open(config).unwrap();
        assert_eq!(select_ids(&mut table), (1..=20).collect::<Vec<_>>());
        assert!(matches!(table.insert(&row(30)), Err(DbError::Config(_))));
        assert!(matches!(table.insert(&row(0)), Err(DbError::Config(_))));
        assert!(matches!(table.tree_mut().verify(), Err(DbError::Config(_))));
    }

    // Nothing was lost; the original limits still work
    let mut table = Table::open_path(&path).unwrap();
    assert_eq!(select_ids(&mut table), (1..=20).collect::<Vec<_>>());
    assert_eq!(table.insert(&row(30)).unwrap(), InsertOutcome::Inserted);
    table.tree_mut().verify().unwrap();
}
