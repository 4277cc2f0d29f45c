//! 运行参数测试

use crate::logging::LoggingConfig;
use crate::settings::{AdminSettings, StoreKind};
use infrastructure_common::SettingsError;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_defaults() {
    let settings = AdminSettings::default();
    assert_eq!(settings.staleness_threshold_secs, 15);
    assert_eq!(settings.store.kind, StoreKind::Memory);
    assert!(settings.modules.enabled.is_empty());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_parse_full_document() {
    let settings = AdminSettings::from_toml_str(
        r#"
staleness_threshold_secs = 30

[store]
kind = "json_file"
path = "/var/lib/admin/overrides.json"

[environment.values]
max-items = "40"

[logging]
level = "debug"
json = true

[modules]
enabled = ["site-admin", "reporting"]
"#,
    )
    .unwrap();

    assert_eq!(settings.staleness_threshold_secs, 30);
    assert_eq!(settings.store.kind, StoreKind::JsonFile);
    assert_eq!(
        settings.store.path,
        Some(PathBuf::from("/var/lib/admin/overrides.json"))
    );
    assert_eq!(settings.environment.values.get("max-items").unwrap(), "40");
    assert!(settings.logging.json);
    assert_eq!(settings.modules.enabled, vec!["site-admin", "reporting"]);

    let logging = LoggingConfig::from_settings(&settings.logging).unwrap();
    assert_eq!(logging.level, tracing::Level::DEBUG);
    assert!(logging.json_format);
}

#[test]
fn test_rejects_out_of_range_threshold() {
    let err = AdminSettings::from_toml_str("staleness_threshold_secs = 0").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue { ref field, .. } if field == "staleness_threshold_secs"));

    let err = AdminSettings::from_toml_str("staleness_threshold_secs = 301").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue { .. }));
}

#[test]
fn test_json_file_store_requires_path() {
    let err = AdminSettings::from_toml_str("[store]\nkind = \"json_file\"").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue { ref field, .. } if field == "store.path"));
}

#[test]
fn test_invalid_log_level() {
    let settings = AdminSettings::from_toml_str("[logging]\nlevel = \"loud\"").unwrap();
    assert!(LoggingConfig::from_settings(&settings.logging).is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "staleness_threshold_secs = 60").unwrap();
    writeln!(file, "[modules]\nenabled = [\"site-admin\"]").unwrap();

    let settings = AdminSettings::load(Some(file.path())).unwrap();
    assert_eq!(settings.staleness_threshold_secs, 60);
    assert_eq!(settings.modules.enabled, vec!["site-admin"]);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = AdminSettings::load(Some(std::path::Path::new("/nonexistent/admin.toml")));
    assert!(matches!(result, Err(SettingsError::LoadFailed { .. })));
}

#[test]
fn test_environment_sources_merge_in_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[properties]\nbanner = \"from-file\"\nmax-items = 20").unwrap();

    let mut settings = AdminSettings::default();
    settings
        .environment
        .values
        .insert("banner".to_string(), "inline".to_string());
    settings
        .environment
        .values
        .insert("theme".to_string(), "dark".to_string());
    settings.environment.file = Some(file.path().to_path_buf());

    let values = settings.load_environment().unwrap();
    assert_eq!(values.get("banner"), Some("from-file"));
    assert_eq!(values.get("max-items"), Some("20"));
    assert_eq!(values.get("theme"), Some("dark"));
}
