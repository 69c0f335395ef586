//! Configuration loading from TOML files.

use tempfile::tempdir;

use sheet_clean_core::config::CleanConfig;
use sheet_clean_core::row::{EntityType, Row};
use sheet_clean_core::validation::run_validations_with;

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sheetclean.toml");

    let config = CleanConfig {
        group_tags: vec!["North".to_string(), "South".to_string()],
        max_query_length: 200,
        ..Default::default()
    };
    config.save_to_file(&path).unwrap();

    let loaded = CleanConfig::from_file(&path).unwrap();
    assert_eq!(loaded.group_tags, ["North", "South"]);
    assert_eq!(loaded.max_query_length, 200);
    assert_eq!(loaded.ai_sample_rows, config.ai_sample_rows);
}

#[test]
fn test_configured_group_tags_drive_validation() {
    let config = CleanConfig::from_toml("group_tags = [\"North\", \"South\"]\n").unwrap();
    let rows = vec![Row::from_pairs([
        ("ClientID", "C1"),
        ("ClientName", "Acme"),
        ("GroupTag", "GroupA"),
    ])];
    let diagnostics = run_validations_with(EntityType::Client, &rows, &config);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "GroupTag must be one of North, South");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(CleanConfig::from_file(dir.path().join("absent.toml")).is_err());
}
