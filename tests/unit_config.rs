use std::fs;

use taskboard::config::{Config, CONFIG_FILE};
use taskboard::model::ScopeMode;

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.ordering.scope, ScopeMode::Status);
    assert_eq!(config.ordering.renumber_step, 1000);
    assert_eq!(config.storage.dir, ".taskboard");
    assert_eq!(config.storage.lock_timeout_ms, 5000);
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let toml = r#"
[ordering]
scope = "milestone"
renumber_step = 64

[storage]
dir = "state"
lock_timeout_ms = 250
"#;
    fs::write(dir.path().join(CONFIG_FILE), toml)?;

    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.ordering.scope, ScopeMode::Milestone);
    assert_eq!(config.ordering.renumber_step, 64);
    assert_eq!(config.storage_dir(dir.path()), dir.path().join("state"));
    assert_eq!(config.storage.lock_timeout_ms, 250);
    Ok(())
}

#[test]
fn invalid_config_falls_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[storage]\nlock_timeout_ms = 0\n")?;

    assert!(Config::load(&path).is_err());
    let config = Config::load_from_dir(dir.path());
    assert_eq!(config.storage.lock_timeout_ms, 5000);
    Ok(())
}
