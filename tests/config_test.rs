//! Tests for SDK configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use deeplinknow::config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_URI_SCHEME};
use deeplinknow::fingerprint::ScreenOverrides;
use deeplinknow::{SdkConfig, SdkError};

const VARS: [&str; 9] = [
    "DLN_API_KEY",
    "DLN_API_BASE_URL",
    "DLN_ENABLE_LOGS",
    "DLN_SCREEN_WIDTH",
    "DLN_SCREEN_HEIGHT",
    "DLN_PIXEL_RATIO",
    "DLN_URI_SCHEME",
    "DLN_STORAGE_PATH",
    "DLN_REQUEST_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_new_uses_defaults() {
    let config = SdkConfig::new("key");

    assert_eq!(config.api_key, "key");
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.uri_scheme, DEFAULT_URI_SCHEME);
    assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    assert!(!config.enable_logs);
    assert_eq!(config.storage_path, None);
    assert_eq!(ScreenOverrides::from(&config), ScreenOverrides::default());
}

#[test]
fn test_builder_setters() {
    let config = SdkConfig::new("key")
        .with_api_base_url("http://localhost:8080/api/v1/sdk/")
        .with_logs(true)
        .with_screen_override(720, 1280, Some(2.0))
        .with_uri_scheme("myapp://")
        .with_storage_path("/tmp/dln.redb")
        .with_request_timeout(Duration::from_secs(3));

    assert_eq!(config.api_base_url, "http://localhost:8080/api/v1/sdk/");
    assert!(config.enable_logs);
    assert_eq!(
        ScreenOverrides::from(&config),
        ScreenOverrides {
            width: Some(720),
            height: Some(1280),
            pixel_ratio: Some(2.0),
        }
    );
    assert_eq!(config.uri_scheme, "myapp://");
    assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/dln.redb")));
    assert_eq!(config.request_timeout, Duration::from_secs(3));
}

// Environment is process-wide, so every from_env case runs in this one test
#[test]
fn test_from_env() {
    clear_env();
    assert!(matches!(
        SdkConfig::from_env(),
        Err(SdkError::MissingConfig("DLN_API_KEY"))
    ));

    env::set_var("DLN_API_KEY", "env-key");
    let config = SdkConfig::from_env().expect("minimal environment should load");
    assert_eq!(config, SdkConfig::new("env-key"));

    env::set_var("DLN_API_BASE_URL", "http://localhost:9000/sdk/");
    env::set_var("DLN_ENABLE_LOGS", "TRUE");
    env::set_var("DLN_SCREEN_WIDTH", "720");
    env::set_var("DLN_SCREEN_HEIGHT", " 1280 ");
    env::set_var("DLN_PIXEL_RATIO", "2.0");
    env::set_var("DLN_URI_SCHEME", "myapp://");
    env::set_var("DLN_STORAGE_PATH", "/var/lib/dln.redb");
    env::set_var("DLN_REQUEST_TIMEOUT_SECS", "7");
    let config = SdkConfig::from_env().expect("full environment should load");
    assert_eq!(config.api_base_url, "http://localhost:9000/sdk/");
    assert!(config.enable_logs);
    assert_eq!(config.override_screen_width, Some(720));
    assert_eq!(config.override_screen_height, Some(1280));
    assert_eq!(config.override_pixel_ratio, Some(2.0));
    assert_eq!(config.uri_scheme, "myapp://");
    assert_eq!(config.storage_path, Some(PathBuf::from("/var/lib/dln.redb")));
    assert_eq!(config.request_timeout, Duration::from_secs(7));

    env::set_var("DLN_SCREEN_WIDTH", "wide");
    match SdkConfig::from_env() {
        Err(SdkError::InvalidConfig { key, value }) => {
            assert_eq!(key, "DLN_SCREEN_WIDTH");
            assert_eq!(value, "wide");
        }
        other => panic!("expected InvalidConfig, got {other:?}"),
    }

    clear_env();
}
