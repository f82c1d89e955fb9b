use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harness: HarnessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Settings for [`crate::testing::TestStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// How long `receive` waits for an effect action (default: 1000).
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// Whether every effect action must be asserted (default: true).
    #[serde(default = "default_exhaustive")]
    pub exhaustive: bool,
    /// Scheduler yields after each fired virtual timer (default: 8).
    #[serde(default = "default_settle_yields")]
    pub settle_yields: u32,
}

impl HarnessConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write logs to this file instead of stderr. `UNISTORE_LOG` overrides it.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Timings used by the demo features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Quiet period before a search runs (default: 300).
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Simulated latency of the in-memory search client (default: 50).
    #[serde(default = "default_search_latency_ms")]
    pub search_latency_ms: u64,
    /// Cooldown of the throttled refresh (default: 100).
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl DemoConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn search_latency(&self) -> Duration {
        Duration::from_millis(self.search_latency_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

fn default_receive_timeout_ms() -> u64 {
    1000
}

fn default_exhaustive() -> bool {
    true
}

fn default_settle_yields() -> u32 {
    crate::engine::clock::DEFAULT_SETTLE_YIELDS
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_search_latency_ms() -> u64 {
    50
}

fn default_throttle_ms() -> u64 {
    100
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: default_receive_timeout_ms(),
            exhaustive: default_exhaustive(),
            settle_yields: default_settle_yields(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            search_latency_ms: default_search_latency_ms(),
            throttle_ms: default_throttle_ms(),
        }
    }
}
