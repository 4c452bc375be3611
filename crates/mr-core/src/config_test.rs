use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: test_project").unwrap();
    assert_eq!(config.name, "test_project");
    assert_eq!(config.dialect, Dialect::DuckDb);
    assert_eq!(config.script_extension(), "sql");
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.group_names(), vec!["init", "additions"]);
    assert_eq!(config.checkpoint.backend, CheckpointBackend::File);
    assert_eq!(config.missing_checkpoint, MissingCheckpointPolicy::Fail);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: inventory
dialect: postgres
extension: .pgsql
database:
  type: duckdb
  path: ./warehouse.duckdb
groups:
  - name: schema
    path: sql/schema
  - name: seed_data
    path: sql/seed
checkpoint:
  backend: table
  table: applied_scripts
missing_checkpoint: reprocess
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.dialect, Dialect::Postgres);
    assert_eq!(config.script_extension(), "pgsql");
    assert_eq!(config.database.path, "./warehouse.duckdb");
    assert_eq!(config.group_names(), vec!["schema", "seed_data"]);
    assert_eq!(config.checkpoint.backend, CheckpointBackend::Table);
    assert_eq!(config.checkpoint.table, "applied_scripts");
    assert_eq!(
        config.missing_checkpoint,
        MissingCheckpointPolicy::Reprocess
    );
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("name: test\nlastfile: 001.sql");
    assert!(result.is_err());
}

#[test]
fn test_validate_empty_name() {
    let config: Config = serde_yaml::from_str("name: ''").unwrap();
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_validate_duplicate_group() {
    let yaml = r#"
name: test
groups:
  - name: init
    path: a
  - name: init
    path: b
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Duplicate group name 'init'"));
}

#[test]
fn test_validate_invalid_group_name() {
    let yaml = r#"
name: test
groups:
  - name: "init; DROP TABLE x"
    path: a
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_groups() {
    let config: Config = serde_yaml::from_str("name: test\ngroups: []").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_bad_extension() {
    let config: Config = serde_yaml::from_str("name: test\nextension: '.'").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_resolves_paths_against_config_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("migrun.yml"), "name: test\n").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    let groups = config.migration_groups();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name(), "init");
    assert_eq!(groups[0].folder(), dir.path().join("db/init"));
    assert_eq!(groups[1].folder(), dir.path().join("db/additions"));
    assert_eq!(
        config.checkpoint_path(),
        dir.path().join(".migrun/checkpoints.yml")
    );
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("migrun.yaml"), "name: alt\n").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "alt");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    let result = Config::load_from_dir(dir.path());
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_load_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("migrun.yml");
    std::fs::write(&path, "name: [unclosed").unwrap();

    let result = Config::load(&path);
    assert!(matches!(result, Err(CoreError::ConfigParseError { .. })));
}

#[test]
fn test_absolute_paths_kept() {
    let mut config = Config::with_defaults("abs");
    config.root = std::path::PathBuf::from("/project");
    let absolute = if cfg!(windows) { "C:\\scripts" } else { "/scripts" };
    assert_eq!(
        config.resolve_path(absolute),
        std::path::PathBuf::from(absolute)
    );
    assert_eq!(
        config.resolve_path("db/init"),
        std::path::PathBuf::from("/project/db/init")
    );
}

#[test]
fn test_with_defaults_round_trips_through_yaml() {
    let config = Config::with_defaults("scaffold");
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
    parsed.validate().unwrap();
    assert_eq!(parsed.name, "scaffold");
    assert_eq!(parsed.database.path, "target/dev.duckdb");
    assert_eq!(parsed.groups, config.groups);
}

#[test]
fn test_dialect_display() {
    assert_eq!(Dialect::DuckDb.to_string(), "duckdb");
    assert_eq!(Dialect::MsSql.to_string(), "mssql");
    let parsed: Dialect = serde_yaml::from_str("mysql").unwrap();
    assert_eq!(parsed, Dialect::MySql);
}
