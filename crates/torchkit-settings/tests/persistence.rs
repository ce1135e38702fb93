use tempfile::TempDir;
use torchkit_settings::{Config, SettingsError};

fn sample() -> Config {
    let mut config = Config::default();
    config.machine.width = 2000.0;
    config.machine.dwell = 1.5;
    config.script.movement_timeout = 30.0;
    config.connection.port = Some("COM4".to_string());
    config.connection.baud_rate = 115200;
    config.connection.mock = false;
    config
}

#[test]
fn test_toml_file_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("config.toml");

    sample().save_to_file(&path).expect("saves");
    assert_eq!(Config::load_from_file(&path).expect("loads"), sample());
}

#[test]
fn test_json_file_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");

    sample().save_to_file(&path).expect("saves");
    let text = std::fs::read_to_string(&path).expect("readable");
    assert!(text.contains("\"baud_rate\": 115200"));
    assert_eq!(Config::load_from_file(&path).expect("loads"), sample());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let config = Config::load_or_default(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_values_are_rejected_on_load_and_save() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[script]\ntick_rate_hz = 0\n").expect("writes");

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::InvalidSetting { .. })
    ));

    let mut config = Config::default();
    config.machine.stop_radius = -1.0;
    assert!(config.save_to_file(&path).is_err());
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").expect("writes");

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::JsonError(_))
    ));
}
