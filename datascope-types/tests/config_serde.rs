use std::time::Duration;

use datascope_types::{DEFAULT_BASE_URL, DssConfig, PollConfig, QuotaConfig, ValidationOptions};

#[test]
fn default_poll_is_fixed_thirty_seconds_unbounded() {
    let poll = PollConfig::default();
    assert_eq!(poll.interval, Duration::from_secs(30));
    assert!(poll.max_attempts.is_none());
    assert!(poll.timeout.is_none());
}

#[test]
fn default_config_targets_hosted_api() {
    let cfg = DssConfig::default();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert!(cfg.keep_duplicates);
    assert!(!cfg.validate_fields_before_extract);
    assert_eq!(cfg.validation_options, ValidationOptions::default());
}

#[test]
fn prefer_header_includes_wait_when_configured() {
    let mut cfg = DssConfig::default();
    assert_eq!(cfg.prefer_header(), "respond-async");
    cfg.respond_async_wait = Some(5);
    assert_eq!(cfg.prefer_header(), "respond-async, wait=5");
}

#[test]
fn config_roundtrip_preserves_poll_settings() {
    let cfg = DssConfig {
        poll: PollConfig {
            interval: Duration::from_secs(2),
            max_attempts: Some(10),
            timeout: Some(Duration::from_secs(600)),
        },
        ..DssConfig::default()
    };

    let json = serde_json::to_string(&cfg).expect("serialize config");
    let de: DssConfig = serde_json::from_str(&json).expect("deserialize config");

    assert_eq!(de.poll, cfg.poll);
    assert_eq!(de.base_url, cfg.base_url);
}

#[test]
fn quota_config_roundtrip() {
    let cfg = QuotaConfig {
        limit: 50,
        window: Duration::from_secs(120),
    };

    let json = serde_json::to_string(&cfg).expect("serialize quota config");
    let de: QuotaConfig = serde_json::from_str(&json).expect("deserialize quota config");

    assert_eq!(de.limit, 50);
    assert_eq!(de.window.as_secs(), 120);
}
