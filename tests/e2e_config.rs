//! E2E tests for configuration loading and live settings

use dualscope::acquire::trigger::TriggerEdge;
use dualscope::config::ScopeConfig;
use dualscope::pipeline::channel::CrossCoreChannel;
use std::io::Write;

/// Defaults match the fixed hardware parameters
#[test]
fn test_default_configuration() {
    let config = ScopeConfig::default();
    assert_eq!(config.sample_rate, 500_000);
    assert_eq!(config.trigger_level, 2048);
    assert_eq!(config.trigger_edge, TriggerEdge::Rising);
    assert_eq!(config.buffer_len, 320);
    assert_eq!(config.num_buffers, 2);
    assert_eq!(config.frame_rate, 60);
    assert!(config.trigger_enabled);
    assert!(!config.hold);
}

/// A config file overrides only the fields it names
#[test]
fn test_load_partial_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"sample_rate": 250000, "trigger_edge": "falling", "frame_rate": 30}}"#
    )
    .unwrap();

    let config = ScopeConfig::load(file.path()).unwrap();
    assert_eq!(config.sample_rate, 250_000);
    assert_eq!(config.trigger_edge, TriggerEdge::Falling);
    assert_eq!(config.frame_rate, 30);
    // Untouched fields keep their defaults
    assert_eq!(config.trigger_level, 2048);
    assert_eq!(config.buffer_len, 320);
}

/// Invalid values are rejected at load time
#[test]
fn test_load_rejects_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"trigger_level": 9000}}"#).unwrap();
    assert!(ScopeConfig::load(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(ScopeConfig::load(file.path()).is_err());

    assert!(ScopeConfig::load(std::path::Path::new("/nonexistent/scope.json")).is_err());
}

/// Config round-trips through serialization
#[test]
fn test_config_roundtrip() {
    let config = ScopeConfig {
        trigger_level: 1000,
        hold: true,
        live_update: true,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: ScopeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.trigger_level, 1000);
    assert!(back.hold);
    assert!(back.live_update);
}

/// Startup config seeds the shared pipeline state
#[test]
fn test_config_seeds_shared_state() {
    let config = ScopeConfig {
        sample_rate: 125_000,
        trigger_level: 3000,
        trigger_edge: TriggerEdge::Falling,
        hold: true,
        ..Default::default()
    };
    let channel = CrossCoreChannel::new(&config);

    let a = channel.acquire_snapshot();
    assert_eq!(a.sample_rate, 125_000);
    assert_eq!(a.trigger_level, 3000);
    assert_eq!(a.trigger_edge, TriggerEdge::Falling);
    assert!(a.hold);

    let r = channel.render_snapshot();
    assert!(r.hold);
    assert!(r.display_slot.is_none());
}

/// Settings changed at runtime are visible to the next snapshot
#[test]
fn test_runtime_setting_changes() {
    let channel = CrossCoreChannel::new(&ScopeConfig::default());
    channel.set_trigger(512, TriggerEdge::Falling, true);
    channel.set_sample_rate(1_000_000);
    channel.set_hold(true);

    let a = channel.acquire_snapshot();
    assert_eq!(a.trigger_level, 512);
    assert_eq!(a.trigger_edge, TriggerEdge::Falling);
    assert_eq!(a.sample_rate, 1_000_000);
    assert!(a.hold);
}
