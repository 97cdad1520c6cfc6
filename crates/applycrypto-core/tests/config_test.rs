//! Tests for the applycrypto configuration system.

use std::sync::Mutex;

use applycrypto_core::config::{
    AliasTable, ApplyCryptoConfig, ConfigOverrides, SqlWrappingType,
};
use applycrypto_core::errors::ConfigError;
use applycrypto_core::types::sensitivity::SensitivityKind;

/// Serializes tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear APPLYCRYPTO_ env vars and point HOME at an empty directory
/// so a developer's user config cannot leak into the test.
fn isolate_env(home: &std::path::Path) {
    for key in [
        "APPLYCRYPTO_SQL_WRAPPING_TYPE",
        "APPLYCRYPTO_MAX_DEPTH",
        "APPLYCRYPTO_DEADLINE_MS",
    ] {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", home);
    std::env::remove_var("USERPROFILE");
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    std::fs::create_dir_all(home.path().join(".applycrypto")).unwrap();
    std::fs::write(
        home.path().join(".applycrypto").join("config.toml"),
        "[analysis]\nmax_fan_out = 64\nmax_depth = 5\n",
    )
    .unwrap();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("applycrypto.toml"),
        r#"
[analysis]
sql_wrapping_type = "jdbc"
max_depth = 8
"#,
    )
    .unwrap();

    std::env::set_var("APPLYCRYPTO_MAX_DEPTH", "12");
    let overrides = ConfigOverrides {
        sql_wrapping_type: Some(SqlWrappingType::MybatisCcs),
        ..Default::default()
    };

    let config = ApplyCryptoConfig::load(dir.path(), Some(&overrides)).unwrap();

    // user layer survives where nothing above sets the field
    assert_eq!(config.analysis.effective_max_fan_out(), 64);
    // env beats project and user
    assert_eq!(config.analysis.effective_max_depth(), 12);
    // overrides beat project
    assert_eq!(
        config.analysis.effective_sql_wrapping_type(),
        SqlWrappingType::MybatisCcs
    );

    std::env::remove_var("APPLYCRYPTO_MAX_DEPTH");
}

#[test]
fn test_load_missing_files_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    let config = ApplyCryptoConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.analysis.effective_sql_wrapping_type(), SqlWrappingType::Mybatis);
    assert_eq!(config.analysis.effective_max_depth(), 20);
    assert_eq!(config.analysis.effective_max_paths_per_query(), 4096);
    assert_eq!(config.scan.effective_max_file_size(), 2_097_152);
    assert_eq!(config.alias_table(), AliasTable::builtin());
}

#[test]
fn test_unknown_wrapping_type_in_env_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    std::env::set_var("APPLYCRYPTO_SQL_WRAPPING_TYPE", "hibernate");
    let dir = tempdir();
    let result = ApplyCryptoConfig::load(dir.path(), None);
    std::env::remove_var("APPLYCRYPTO_SQL_WRAPPING_TYPE");

    match result {
        Err(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "APPLYCRYPTO_SQL_WRAPPING_TYPE")
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    std::fs::write(dir.path().join("applycrypto.toml"), "this is not valid toml {{{{").unwrap();

    match ApplyCryptoConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("expected ParseError, got: {other:?}"),
    }
}

#[test]
fn test_zero_limits_fail_validation() {
    let config = ApplyCryptoConfig::from_toml("[analysis]\nmax_depth = 0\n").unwrap();
    match ApplyCryptoConfig::validate(&config) {
        Err(ConfigError::ValidationFailed { field, .. }) => assert_eq!(field, "analysis.max_depth"),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn test_alias_table_rejects_a_fourth_kind() {
    let result = ApplyCryptoConfig::from_toml(
        r#"
[sensitive_columns]
name = ["emp_nm"]
phone_number = ["tel_no"]
"#,
    );
    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "an extra sensitivity class must not deserialize"
    );
}

#[test]
fn test_alias_table_replaces_builtin_whole() {
    let config = ApplyCryptoConfig::from_toml(
        r#"
[sensitive_columns]
name = ["emp_nm", "*_cust_nm"]
"#,
    )
    .unwrap();
    let table = config.alias_table();
    assert_eq!(table.patterns(SensitivityKind::Name).len(), 2);
    assert!(table.patterns(SensitivityKind::DateOfBirth).is_empty());
    assert!(table.patterns(SensitivityKind::NationalId).is_empty());
    ApplyCryptoConfig::validate(&config).unwrap();
}

#[test]
fn test_empty_alias_table_fails_validation() {
    let config = ApplyCryptoConfig::from_toml("[sensitive_columns]\n").unwrap();
    assert!(ApplyCryptoConfig::validate(&config).is_err());
}

#[test]
fn test_bad_glob_fails_validation() {
    let config = ApplyCryptoConfig::from_toml(
        r#"
[boundaries]
session_read = ["[unclosed"]
"#,
    )
    .unwrap();
    match ApplyCryptoConfig::validate(&config) {
        Err(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "boundaries.session_read")
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_toml_round_trip() {
    let config = ApplyCryptoConfig::from_toml(
        r#"
[analysis]
sql_wrapping_type = "mybatis_ccs"
deadline_ms = 30000
"#,
    )
    .unwrap();
    let text = config.to_toml().unwrap();
    let back = ApplyCryptoConfig::from_toml(&text).unwrap();
    assert_eq!(back.analysis.sql_wrapping_type, Some(SqlWrappingType::MybatisCcs));
    assert_eq!(back.analysis.deadline_ms, Some(30000));
}
