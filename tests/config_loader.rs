mod common;

use common::{ms, temp_config};
use unistore::config::{Config, ConfigError};
use unistore::features::counter::{CounterAction, CounterReducer, CounterState};
use unistore::TestStore;

#[test]
fn full_file_round_trips_every_section() {
    let (_dir, path) = temp_config(
        r#"
[harness]
receive_timeout_ms = 40
exhaustive = false
settle_yields = 3

[logging]
filter = "unistore=trace"
file = "/tmp/unistore.log"

[demo]
search_debounce_ms = 120
search_latency_ms = 0
throttle_ms = 75
"#,
    );

    let config = Config::load_from(&path).expect("valid config");
    assert_eq!(config.harness.receive_timeout(), ms(40));
    assert!(!config.harness.exhaustive);
    assert_eq!(config.harness.settle_yields, 3);
    assert_eq!(config.logging.filter, "unistore=trace");
    assert_eq!(
        config.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/unistore.log"))
    );
    assert_eq!(config.demo.search_debounce(), ms(120));
    assert_eq!(config.demo.search_latency(), ms(0));
    assert_eq!(config.demo.throttle(), ms(75));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = temp_config("[harness\nreceive_timeout_ms = ");
    match Config::load_from(&path) {
        Err(ConfigError::ParseError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn blank_log_filter_is_rejected() {
    let (_dir, path) = temp_config("[logging]\nfilter = \"  \"");
    let err = Config::load_from(&path).expect_err("blank filter");
    assert!(err.to_string().contains("logging.filter"));
}

#[test]
fn zero_debounce_is_rejected() {
    let (_dir, path) = temp_config("[demo]\nsearch_debounce_ms = 0");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn config_path_ends_in_crate_dir() {
    let path = Config::config_path();
    assert!(path.ends_with("unistore/config.toml"));
}

#[tokio::test]
async fn harness_settings_come_from_config() {
    let (_dir, path) = temp_config("[harness]\nexhaustive = false");
    let config = Config::load_from(&path).expect("valid config");

    let mut store = TestStore::with_config(
        CounterState::default(),
        CounterReducer,
        common::demo_env(),
        &config.harness,
    );
    store.send(CounterAction::IncrementAfter(ms(10)), |_| {});
    store.advance_time(ms(10)).await;
    // Not asserted; non-exhaustive mode lets the store drop cleanly.
    store.send(CounterAction::Decrement, |state| assert_eq!(state.count, -1));
}
