//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use unistore::config::DemoConfig;
use unistore::features::search::InMemorySearchClient;
use unistore::features::Env;
use unistore::{EffectError, StoreOptions};

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Demo environment with an instant in-memory search backend.
pub fn demo_env() -> Env {
    Env::from_config(
        Arc::new(InMemorySearchClient::catalogue()),
        &DemoConfig::default(),
    )
}

/// Store options whose error hook records every failure message.
pub fn recording_hook() -> (StoreOptions, Arc<Mutex<Vec<String>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let options =
        StoreOptions::new().error_hook(move |err: &EffectError| sink.lock().push(err.to_string()));
    (options, errors)
}

/// Create a temporary config file with the given TOML content.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Yield to the current-thread scheduler a few times.
pub async fn yield_a_bit() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
