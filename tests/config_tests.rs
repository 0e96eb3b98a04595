use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use workload_journal::{ConfigError, JournalConfig, LedgerCoordinator, RetryPolicy};

#[test]
fn defaults_match_workbook_layout() {
    let config = JournalConfig::default();
    assert_eq!(config.layout.monthly_base_row, 7);
    assert_eq!(config.layout.season_base_row, 5);
    assert_eq!(config.layout.season_capacity, 50);
    assert_eq!((config.calendar.anchor_month, config.calendar.anchor_day), (9, 1));
    assert_eq!(config.seasons.autumn_sheet, "осень");
    assert_eq!(config.seasons.spring_sheet, "весна");
    assert_eq!(config.retry.attempts, 3);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = JournalConfig::from_toml_str(
        r#"
        [layout]
        season_capacity = 20

        [retry]
        backoff_ms = 100
        "#,
    )
    .unwrap();
    assert_eq!(config.layout.season_capacity, 20);
    assert_eq!(config.layout.monthly_base_row, 7);
    assert_eq!(config.retry.attempts, 3);

    let policy = RetryPolicy::from(&config.retry);
    assert_eq!(policy.backoff, Duration::from_millis(100));

    let coordinator = LedgerCoordinator::new(&config).unwrap();
    assert_eq!(coordinator.season().capacity(), 20);
    assert_eq!(coordinator.monthly().base_row(), 7);
}

#[test]
fn empty_toml_is_the_default_config() {
    assert_eq!(JournalConfig::from_toml_str("").unwrap(), JournalConfig::default());
}

#[test]
fn invalid_values_are_rejected() {
    for raw in [
        "[calendar]\nanchor_month = 2\nanchor_day = 29",
        "[calendar]\nanchor_month = 13",
        "[retry]\nattempts = 0",
        "[layout]\nmonthly_base_row = 0",
        "[layout]\nseason_capacity = 0",
        "[seasons]\nautumn_sheet = \" \"",
    ] {
        assert!(
            matches!(JournalConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))),
            "{raw}"
        );
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    assert!(matches!(
        JournalConfig::from_toml_str("[layout\nseason_capacity = 1"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        JournalConfig::from_toml_str("[layout]\nseason_capacity = \"many\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn load_reads_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.toml");
    fs::write(&path, "[seasons]\nautumn_sheet = \"Осень 2024\"\n").unwrap();

    let config = JournalConfig::load(&path).unwrap();
    assert_eq!(config.seasons.autumn_sheet, "Осень 2024");
    assert_eq!(config.seasons.spring_sheet, "весна");

    assert!(matches!(
        JournalConfig::load(dir.path().join("missing.toml")),
        Err(ConfigError::Io(_))
    ));
}
