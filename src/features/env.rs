use std::sync::Arc;
use std::time::Duration;

use crate::config::DemoConfig;
use crate::engine::{Clock, TokioClock};
use crate::features::search::{InMemorySearchClient, SearchClient};

/// Dependencies shared by every demo feature.
#[derive(Clone)]
pub struct Env {
    pub search_client: Arc<dyn SearchClient>,
    pub search_debounce: Duration,
    pub throttle: Duration,
    /// Period of the detail screen's timer subscription.
    pub tick: Duration,
    /// Drives the detail timer; share it with the store's clock in tests.
    pub clock: Arc<dyn Clock>,
}

impl Env {
    pub fn new(search_client: Arc<dyn SearchClient>) -> Self {
        Self::from_config(search_client, &DemoConfig::default())
    }

    pub fn from_config(search_client: Arc<dyn SearchClient>, config: &DemoConfig) -> Self {
        Self {
            search_client,
            search_debounce: config.search_debounce(),
            throttle: config.throttle(),
            tick: Duration::from_secs(1),
            clock: Arc::new(TokioClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Environment backed by the bundled in-memory catalogue.
    pub fn demo(config: &DemoConfig) -> Self {
        let client = InMemorySearchClient::catalogue().with_latency(config.search_latency());
        Self::from_config(Arc::new(client), config)
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("search_debounce", &self.search_debounce)
            .field("throttle", &self.throttle)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
