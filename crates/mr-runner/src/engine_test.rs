use super::*;
use mr_core::{CoreError, CoreResult, FileCheckpointStore, MemoryCheckpointStore};
use mr_db::{DuckDbBackend, TableCheckpointStore};
use std::path::Path;
use tempfile::TempDir;

fn write_scripts(dir: &Path, group: &str, scripts: &[(&str, &str)]) -> MigrationGroup {
    let folder = dir.join(group);
    std::fs::create_dir_all(&folder).unwrap();
    for (name, sql) in scripts {
        std::fs::write(folder.join(name), sql).unwrap();
    }
    MigrationGroup::new(group, folder)
}

fn memory_db() -> Arc<dyn Database> {
    Arc::new(DuckDbBackend::in_memory().unwrap())
}

fn engine_with(db: &Arc<dyn Database>, store: impl CheckpointStore + 'static) -> MigrationEngine {
    MigrationEngine::new(Arc::clone(db), Box::new(store), EngineOptions::default())
}

fn scalar(db: &Arc<dyn Database>, sql: &str) -> Option<String> {
    db.query_scalar(sql).unwrap()
}

/// Store that reads fine but refuses writes for one group
struct ReadOnlyGroupStore {
    inner: MemoryCheckpointStore,
    read_only: &'static str,
}

impl CheckpointStore for ReadOnlyGroupStore {
    fn get(&self, group: &str) -> CoreResult<Option<String>> {
        self.inner.get(group)
    }

    fn set(&mut self, group: &str, file_name: &str) -> CoreResult<()> {
        if group == self.read_only {
            return Err(CoreError::CheckpointWrite {
                group: group.to_string(),
                file: file_name.to_string(),
                message: "read-only".to_string(),
            });
        }
        self.inner.set(group, file_name)
    }

    fn backend_name(&self) -> &'static str {
        "read-only"
    }
}

/// Store whose reads always fail
struct BrokenStore;

impl CheckpointStore for BrokenStore {
    fn get(&self, group: &str) -> CoreResult<Option<String>> {
        Err(CoreError::CheckpointRead {
            group: group.to_string(),
            message: "corrupt".to_string(),
        })
    }

    fn set(&mut self, _group: &str, _file_name: &str) -> CoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "broken"
    }
}

#[test]
fn test_applies_files_in_order_and_advances_checkpoint() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("002_insert.sql", "INSERT INTO users VALUES (1, 'ada');"),
            ("001_create.sql", "CREATE TABLE users (id INT, name VARCHAR);"),
            ("003_insert.sql", "INSERT INTO users VALUES (2, 'grace');"),
        ],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert_eq!(
        report.applied,
        vec!["001_create.sql", "002_insert.sql", "003_insert.sql"]
    );
    assert_eq!(report.statements_executed, 3);
    assert!(report.skipped.is_empty());
    assert_eq!(report.outcome, GroupOutcome::Done);
    assert_eq!(
        scalar(&db, "SELECT COUNT(*)::VARCHAR FROM users").as_deref(),
        Some("2")
    );
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("003_insert.sql")
    );
}

#[test]
fn test_failing_statement_is_skipped_and_checkpoint_advances() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[(
            "001_mixed.sql",
            "CREATE TABLE t (id INT);\n\
             INSERT INTO missing_table VALUES (1);\n\
             INSERT INTO t VALUES (42);",
        )],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert_eq!(report.statements_executed, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "001_mixed.sql");
    assert_eq!(
        report.skipped[0].statement,
        "INSERT INTO missing_table VALUES (1)"
    );
    assert_eq!(scalar(&db, "SELECT id::VARCHAR FROM t").as_deref(), Some("42"));
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("001_mixed.sql")
    );
}

#[test]
fn test_rerun_is_noop() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[("001_create.sql", "CREATE TABLE once (id INT);")],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    engine.run_group(&group).unwrap();
    let second = engine.run_group(&group).unwrap();

    assert!(second.pending.is_empty());
    assert!(second.applied.is_empty());
    assert!(second.skipped.is_empty());
    assert_eq!(second.checkpoint_before.as_deref(), Some("001_create.sql"));
}

#[test]
fn test_resumes_after_checkpoint() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE a (id INT);"),
            ("002_b.sql", "CREATE TABLE b (id INT);"),
            ("003_c.sql", "CREATE TABLE c (id INT);"),
        ],
    );
    let db = memory_db();
    let store = MemoryCheckpointStore::with_entries([("init", "001_a.sql")]);
    let mut engine = engine_with(&db, store);

    let report = engine.run_group(&group).unwrap();

    assert_eq!(report.pending, vec!["002_b.sql", "003_c.sql"]);
    assert!(db.execute("SELECT * FROM a").is_err());
    db.execute("SELECT * FROM b").unwrap();
    db.execute("SELECT * FROM c").unwrap();
}

#[test]
fn test_empty_file_counts_as_applied() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[("001_empty.sql", ""), ("002_blank.sql", "\n  \n")],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert_eq!(report.applied, vec!["001_empty.sql", "002_blank.sql"]);
    assert_eq!(report.statements_executed, 0);
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("002_blank.sql")
    );
}

#[test]
fn test_groups_run_in_order() {
    let dir = TempDir::new().unwrap();
    let init = write_scripts(
        dir.path(),
        "init",
        &[("001_schema.sql", "CREATE TABLE orders (id INT);")],
    );
    let additions = write_scripts(
        dir.path(),
        "additions",
        &[("20240101_seed.sql", "INSERT INTO orders VALUES (1), (2);")],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let summary = engine.run(&[init, additions]).unwrap();

    assert_eq!(summary.groups.len(), 2);
    assert_eq!(summary.groups[0].group, "init");
    assert_eq!(summary.groups[1].group, "additions");
    assert_eq!(summary.files_applied(), 2);
    assert_eq!(summary.skipped_count(), 0);
    assert!(summary.completed());
    assert_eq!(
        scalar(&db, "SELECT COUNT(*)::VARCHAR FROM orders").as_deref(),
        Some("2")
    );
}

#[test]
fn test_checkpoint_write_failure_halts_only_that_group() {
    let dir = TempDir::new().unwrap();
    let init = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE a (id INT);"),
            ("002_b.sql", "CREATE TABLE b (id INT);"),
        ],
    );
    let additions = write_scripts(
        dir.path(),
        "additions",
        &[("001_c.sql", "CREATE TABLE c (id INT);")],
    );
    let db = memory_db();
    let store = ReadOnlyGroupStore {
        inner: MemoryCheckpointStore::new(),
        read_only: "init",
    };
    let mut engine = engine_with(&db, store);

    let summary = engine.run(&[init, additions]).unwrap();

    let init_report = &summary.groups[0];
    assert!(init_report.is_halted());
    assert!(init_report.applied.is_empty());
    assert!(matches!(
        &init_report.outcome,
        GroupOutcome::Halted { file, .. } if file == "001_a.sql"
    ));
    // The halted group stops before its second file.
    assert!(db.execute("SELECT * FROM b").is_err());

    assert_eq!(summary.groups[1].applied, vec!["001_c.sql"]);
    assert!(!summary.completed());
}

#[test]
fn test_checkpoint_read_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(dir.path(), "init", &[("001_a.sql", "SELECT 1;")]);
    let db = memory_db();
    let mut engine = engine_with(&db, BrokenStore);

    let result = engine.run(&[group]);
    assert!(matches!(result, Err(RunError::CheckpointRead { .. })));
}

#[test]
fn test_missing_folder_aborts_run() {
    let dir = TempDir::new().unwrap();
    let group = MigrationGroup::new("additions", dir.path().join("absent"));
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let result = engine.run(&[group]);
    assert!(matches!(result, Err(RunError::Selection { .. })));
}

#[test]
fn test_lost_connection_aborts_without_advancing() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(dir.path(), "init", &[("001_a.sql", "SELECT 1;")]);
    let db = memory_db();
    db.close().unwrap();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let result = engine.run_group(&group);

    assert!(matches!(result, Err(RunError::Connection { .. })));
    assert_eq!(engine.checkpoints().get("init").unwrap(), None);
}

#[test]
fn test_unreadable_file_halts_group() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE a (id INT);"),
            ("003_c.sql", "CREATE TABLE c (id INT);"),
        ],
    );
    std::fs::write(group.folder().join("002_b.sql"), [0xff, 0xfe, 0x00]).unwrap();
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert_eq!(report.applied, vec!["001_a.sql"]);
    assert!(report.is_halted());
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("001_a.sql")
    );
    assert!(db.execute("SELECT * FROM c").is_err());
}

#[test]
fn test_reprocess_policy_never_regresses_checkpoint() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE IF NOT EXISTS a (id INT);"),
            ("003_c.sql", "CREATE TABLE IF NOT EXISTS c (id INT);"),
        ],
    );
    let db = memory_db();
    let store = MemoryCheckpointStore::with_entries([("init", "002_b.sql")]);
    let options = EngineOptions {
        missing_checkpoint: MissingCheckpointPolicy::Reprocess,
        ..EngineOptions::default()
    };
    let mut engine = MigrationEngine::new(Arc::clone(&db), Box::new(store), options);

    let report = engine.run_group(&group).unwrap();

    assert_eq!(report.applied, vec!["001_a.sql", "003_c.sql"]);
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("003_c.sql")
    );
}

#[test]
fn test_missing_checkpoint_file_fails_by_default() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(dir.path(), "init", &[("001_a.sql", "SELECT 1;")]);
    let db = memory_db();
    let store = MemoryCheckpointStore::with_entries([("init", "000_gone.sql")]);
    let mut engine = engine_with(&db, store);

    let result = engine.run_group(&group);
    assert!(matches!(
        result,
        Err(RunError::Selection {
            source: CoreError::CheckpointFileMissing { .. },
            ..
        })
    ));
}

#[test]
fn test_plan_does_not_execute() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE a (id INT);"),
            ("002_b.sql", "CREATE TABLE b (id INT);"),
        ],
    );
    let db = memory_db();
    let store = MemoryCheckpointStore::with_entries([("init", "001_a.sql")]);
    let engine = engine_with(&db, store);

    let plan = engine.plan(&[group]).unwrap();

    assert_eq!(
        plan,
        vec![GroupPlan {
            group: "init".to_string(),
            checkpoint: Some("001_a.sql".to_string()),
            pending: vec!["002_b.sql".to_string()],
        }]
    );
    assert!(db.execute("SELECT * FROM b").is_err());
}

#[test]
fn test_script_transaction_left_open_is_committed() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            (
                "001_tx.sql",
                "CREATE TABLE t (id INT); BEGIN TRANSACTION; INSERT INTO t VALUES (1);",
            ),
            ("002_tx.sql", "BEGIN TRANSACTION; INSERT INTO t VALUES (2); COMMIT;"),
        ],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(
        scalar(&db, "SELECT COUNT(*)::VARCHAR FROM t").as_deref(),
        Some("2")
    );
}

#[test]
fn test_aborted_transaction_does_not_leak_into_next_file() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_schema.sql", "CREATE TABLE t (id INT);"),
            (
                "002_aborted.sql",
                "BEGIN TRANSACTION;\n\
                 INSERT INTO missing VALUES (1);\n\
                 INSERT INTO t VALUES (1);",
            ),
            ("003_after.sql", "INSERT INTO t VALUES (2);"),
        ],
    );
    let db = memory_db();
    let mut engine = engine_with(&db, MemoryCheckpointStore::new());

    let report = engine.run_group(&group).unwrap();

    assert!(report
        .skipped
        .iter()
        .any(|s| s.file == "002_aborted.sql" && s.statement == "INSERT INTO missing VALUES (1)"));
    assert!(report.skipped.iter().all(|s| s.file == "002_aborted.sql"));
    assert_eq!(
        scalar(&db, "SELECT COUNT(*)::VARCHAR FROM t WHERE id = 2").as_deref(),
        Some("1")
    );
    assert_eq!(
        engine.checkpoints().get("init").unwrap().as_deref(),
        Some("003_after.sql")
    );
}

#[test]
fn test_file_backend_persists_across_engines() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[("001_a.sql", "CREATE TABLE IF NOT EXISTS a (id INT);")],
    );
    let state = dir.path().join(".migrun/checkpoints.yml");
    let db = memory_db();

    let mut first = engine_with(&db, FileCheckpointStore::new(&state));
    assert_eq!(first.run_group(&group).unwrap().applied.len(), 1);

    std::fs::write(
        group.folder().join("002_b.sql"),
        "CREATE TABLE IF NOT EXISTS b (id INT);",
    )
    .unwrap();

    let mut second = engine_with(&db, FileCheckpointStore::new(&state));
    let report = second.run_group(&group).unwrap();
    assert_eq!(report.applied, vec!["002_b.sql"]);
}

#[test]
fn test_table_backend_shares_connection() {
    let dir = TempDir::new().unwrap();
    let group = write_scripts(
        dir.path(),
        "init",
        &[
            ("001_a.sql", "CREATE TABLE a (id INT);"),
            ("002_b.sql", "INSERT INTO a VALUES (1);"),
        ],
    );
    let db = memory_db();
    let store = TableCheckpointStore::new(Arc::clone(&db), "migrun_checkpoint");
    store.prepare(&["init"]).unwrap();
    let mut engine = engine_with(&db, store);

    engine.run_group(&group).unwrap();

    assert_eq!(
        scalar(&db, "SELECT last_file_init FROM migrun_checkpoint WHERE id = 1").as_deref(),
        Some("002_b.sql")
    );
    assert!(engine.run_group(&group).unwrap().pending.is_empty());
}
