use std::fs;
use std::path::Path;
use tempfile::tempdir;

use doc_catalog_core::export::ExportTable;
use doc_catalog_core::storage::Database;
use doc_catalog_core::{
    export, CatalogConfig, CatalogEngine, ConflictPolicy, EngineState, Error, SilentReporter,
};

/// Layout:
///   root/
///     a.txt      ("X")
///     b.txt      ("X")  ← same content as a.txt
///     c.txt      ("Y")
///     tmp/
///       d.txt    ("X")  ← excluded directory
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root.join("tmp")).unwrap();
    fs::write(root.join("a.txt"), "X").unwrap();
    fs::write(root.join("b.txt"), "X").unwrap();
    fs::write(root.join("c.txt"), "Y").unwrap();
    fs::write(root.join("tmp").join("d.txt"), "X").unwrap();
}

fn base_config(root: &Path, store: &Path) -> CatalogConfig {
    CatalogConfig {
        search_dirs: vec![root.to_path_buf()],
        base_dir: root.to_path_buf(),
        exclude_dirs: vec!["tmp".to_string()],
        store_path: store.to_path_buf(),
        ..CatalogConfig::default()
    }
}

fn cell<'a>(table: &'a ExportTable, filename: &str, column: &str) -> &'a str {
    let name_idx = table.column_index("Filename").unwrap();
    let col_idx = table.column_index(column).unwrap();
    let row = table
        .rows
        .iter()
        .find(|row| row[name_idx] == filename)
        .unwrap_or_else(|| panic!("no row for {}", filename));
    &row[col_idx]
}

#[test]
fn test_duplicates_and_exclusions() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    create_test_tree(&root);
    let store = tmp.path().join("catalog.db");

    let mut engine = CatalogEngine::new(base_config(&root, &store));
    let report = engine.run(&SilentReporter).unwrap();

    assert_eq!(report.new_files, 3);
    assert_eq!(report.existing_files, 0);
    assert_eq!(report.duplicate_files, 1);
    assert_eq!(engine.state(), EngineState::Done);

    // a.txt is visited first and stays canonical; b.txt is the duplicate
    assert_eq!(cell(&report.export, "a.txt", "Duplicate"), "false");
    assert_eq!(cell(&report.export, "b.txt", "Duplicate"), "true");
    assert_eq!(cell(&report.export, "c.txt", "Duplicate"), "false");

    // the excluded directory must not appear anywhere
    let path_idx = report.export.column_index("File Path").unwrap();
    assert!(report
        .export
        .rows
        .iter()
        .all(|row| !row[path_idx].contains("tmp")));
}

#[test]
fn test_merge_with_prior_export() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("x.txt"), "first").unwrap();
    fs::write(root.join("y.txt"), "second").unwrap();

    let export_path = tmp.path().join("catalog.csv");
    let mut config = base_config(&root, &tmp.path().join("first.db"));
    config.export_path = Some(export_path.clone());

    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&SilentReporter).unwrap();
    assert_eq!(report.new_files, 2);
    export::write_csv(&report.export, &export_path).unwrap();

    // one new file appears between runs
    fs::write(root.join("z.txt"), "third").unwrap();

    let mut config = base_config(&root, &tmp.path().join("second.db"));
    config.existing_catalog = Some(export_path);
    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&SilentReporter).unwrap();

    assert_eq!(report.existing_files, 2);
    assert_eq!(report.new_files, 1);
    assert_eq!(report.export.rows.len(), 3);
    // only the genuinely new record reaches the store
    let db = Database::open(&tmp.path().join("second.db")).unwrap();
    assert_eq!(db.count_files().unwrap(), 1);
}

#[test]
fn test_idempotent_rewalk_admits_nothing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    create_test_tree(&root);

    let export_path = tmp.path().join("catalog.csv");
    let mut engine = CatalogEngine::new(base_config(&root, &tmp.path().join("first.db")));
    let report = engine.run(&SilentReporter).unwrap();
    export::write_csv(&report.export, &export_path).unwrap();

    let mut config = base_config(&root, &tmp.path().join("second.db"));
    config.existing_catalog = Some(export_path);
    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&SilentReporter).unwrap();

    assert_eq!(report.existing_files, 3);
    assert_eq!(report.new_files, 0);
}

#[test]
fn test_flush_invariant_holds_after_teardown() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    for i in 0..5 {
        fs::write(root.join(format!("f{}.txt", i)), format!("content {}", i)).unwrap();
    }
    let store = tmp.path().join("catalog.db");

    let mut config = base_config(&root, &store);
    config.flush_threshold = 2;
    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&SilentReporter).unwrap();

    assert_eq!(report.new_files, 5);
    assert_eq!(report.flushed_rows, 5);

    // the store holds exactly the admitted set, no missing or extra rows
    let db = Database::open(&store).unwrap();
    assert_eq!(db.count_files().unwrap(), 5);
    let distinct: i64 = db
        .connection()
        .query_row("SELECT COUNT(DISTINCT file_key) FROM files", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(distinct, 5);
}

#[test]
fn test_cancellation_keeps_store_consistent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    create_test_tree(&root);
    let store = tmp.path().join("catalog.db");

    let mut engine = CatalogEngine::new(base_config(&root, &store));
    engine
        .cancel_token()
        .store(true, std::sync::atomic::Ordering::Relaxed);

    match engine.run(&SilentReporter) {
        Err(Error::Cancelled) => {}
        other => panic!("expected Cancelled, got {:?}", other.map(|_| ())),
    }
    assert_eq!(engine.state(), EngineState::Failed);

    // the session row is durable; no partial file rows were lost or invented
    let db = Database::open(&store).unwrap();
    assert_eq!(db.list_sessions().unwrap().len(), 1);
    assert_eq!(db.count_files().unwrap(), 0);
}

#[test]
fn test_content_check_disabled_skips_hashing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "same").unwrap();
    fs::write(root.join("b.txt"), "same").unwrap();

    let mut config = base_config(&root, &tmp.path().join("catalog.db"));
    config.check_contents = false;
    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&SilentReporter).unwrap();

    // identical content is irrelevant in path mode
    assert_eq!(report.new_files, 2);
    assert_eq!(report.duplicate_files, 0);
    assert_eq!(cell(&report.export, "a.txt", "Checksum"), "");
    assert_eq!(cell(&report.export, "a.txt", "Duplicate"), "false");
    assert_eq!(cell(&report.export, "b.txt", "Duplicate"), "false");
    // sizes still come from metadata
    assert_eq!(cell(&report.export, "a.txt", "File Size"), "4");
}

#[test]
fn test_existing_store_requires_explicit_policy() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    create_test_tree(&root);
    let store = tmp.path().join("catalog.db");

    let mut engine = CatalogEngine::new(base_config(&root, &store));
    engine.run(&SilentReporter).unwrap();

    // default policy refuses to touch the existing store
    let mut engine = CatalogEngine::new(base_config(&root, &store));
    match engine.run(&SilentReporter) {
        Err(Error::StoreConflict(path)) => assert_eq!(path, store),
        other => panic!("expected StoreConflict, got {:?}", other.map(|_| ())),
    }
    assert_eq!(engine.state(), EngineState::Failed);

    // appending is allowed when asked for
    let mut config = base_config(&root, &store);
    config.conflict_policy = ConflictPolicy::Append;
    let mut engine = CatalogEngine::new(config);
    engine.run(&SilentReporter).unwrap();

    let db = Database::open(&store).unwrap();
    assert_eq!(db.list_sessions().unwrap().len(), 2);
}

#[test]
fn test_invalid_export_path_aborts_before_work() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("tree");
    create_test_tree(&root);
    let store = tmp.path().join("catalog.db");

    let mut config = base_config(&root, &store);
    config.export_path = Some(tmp.path().join("catalog.xlsx"));
    let mut engine = CatalogEngine::new(config);

    match engine.run(&SilentReporter) {
        Err(Error::InvalidConfig(_)) => {}
        other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
    }
    assert_eq!(engine.state(), EngineState::Failed);
    // no store was created
    assert!(!store.exists());
}
