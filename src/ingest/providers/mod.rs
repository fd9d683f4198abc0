// src/ingest/providers/mod.rs
pub mod rss;

use crate::ingest::types::FeedProvider;
use crate::registry::SourceRegistry;

pub use rss::RssProvider;

/// One HTTP RSS provider per registry entry.
pub fn from_registry(registry: &SourceRegistry) -> anyhow::Result<Vec<Box<dyn FeedProvider>>> {
    let client = rss::http_client()?;
    Ok(registry
        .sources()
        .iter()
        .map(|s| {
            Box::new(RssProvider::from_url(&s.name, &s.endpoint, client.clone()))
                as Box<dyn FeedProvider>
        })
        .collect())
}
