// Settings tests

use crate::config::{UpnpSettings, IGD_SEARCH_TARGET};
use crate::Error;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_settings_default() {
    let settings = UpnpSettings::default();

    assert_eq!(settings.search_target, IGD_SEARCH_TARGET);
    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.attempt_timeout(), Duration::from_secs(3));
    assert_eq!(settings.mx, 2);
    assert_eq!(settings.multicast_addr.to_string(), "239.255.255.250:1900");
    assert_eq!(settings.http_timeout(), Duration::from_secs(5));
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings = UpnpSettings::load(temp_dir.path().join("absent.json")).unwrap();
    assert_eq!(settings, UpnpSettings::default());
}

#[test]
fn test_settings_load_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("upnp.json");
    std::fs::write(&path, "  \n").unwrap();

    assert_eq!(UpnpSettings::load(&path).unwrap(), UpnpSettings::default());
}

#[test]
fn test_settings_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("upnp.json");

    let settings = UpnpSettings {
        max_attempts: 5,
        attempt_timeout_ms: 1_500,
        user_agent: "test-agent/1.0".to_string(),
        ..UpnpSettings::default()
    };
    settings.save(&path).unwrap();

    assert_eq!(UpnpSettings::load(&path).unwrap(), settings);
}

#[test]
fn test_settings_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("upnp.json");
    std::fs::write(&path, r#"{ "max_attempts": 7 }"#).unwrap();

    let settings = UpnpSettings::load(&path).unwrap();
    assert_eq!(settings.max_attempts, 7);
    assert_eq!(settings.search_target, IGD_SEARCH_TARGET);
}

#[test]
fn test_settings_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("upnp.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(UpnpSettings::load(&path), Err(Error::Settings(_))));
}

#[test]
fn test_settings_validation() {
    let zero_attempts = UpnpSettings {
        max_attempts: 0,
        ..UpnpSettings::default()
    };
    assert!(matches!(zero_attempts.validate(), Err(Error::Settings(_))));

    let zero_timeout = UpnpSettings {
        attempt_timeout_ms: 0,
        ..UpnpSettings::default()
    };
    assert!(zero_timeout.validate().is_err());

    let blank_target = UpnpSettings {
        search_target: " ".to_string(),
        ..UpnpSettings::default()
    };
    assert!(blank_target.validate().is_err());

    let ipv6_group = UpnpSettings {
        multicast_addr: "[ff02::c]:1900".parse().unwrap(),
        ..UpnpSettings::default()
    };
    assert!(matches!(ipv6_group.validate(), Err(Error::Settings(_))));
}
