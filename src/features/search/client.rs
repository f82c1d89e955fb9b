use std::time::Duration;

use async_trait::async_trait;

/// Backend the search feature queries.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<String>>;
}

/// Case-insensitive substring search over a fixed list.
#[derive(Debug, Clone)]
pub struct InMemorySearchClient {
    entries: Vec<String>,
    latency: Duration,
}

impl InMemorySearchClient {
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            latency: Duration::ZERO,
        }
    }

    /// Small catalogue of crate names used by the demo binary.
    pub fn catalogue() -> Self {
        Self::new([
            "tokio", "futures", "serde", "serde_json", "toml", "tracing",
            "tracing-subscriber", "thiserror", "anyhow", "parking_lot", "clap", "uuid",
        ])
    }

    /// Sleep this long (real time) before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl SearchClient for InMemorySearchClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<String>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
