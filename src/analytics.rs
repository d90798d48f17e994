use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::parser::ParsedQuery;

/// What a search understood, recorded for offline tuning of the parsing rules.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchEvent {
    pub original_query: String,
    pub parsed: ParsedQuery,
    pub confidence: u8,
    pub fallback: bool,
    pub total: usize,
    pub searched_at: DateTime<Utc>,
}

/// Receives search events. Implementations must return immediately; the search
/// response never waits on analytics.
pub trait SearchEventSink: Send + Sync {
    fn record(&self, event: SearchEvent);
}

/// Writes events to the log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl SearchEventSink for TracingSink {
    fn record(&self, event: SearchEvent) {
        tracing::info!(
            target: "search_events",
            query = %event.original_query,
            confidence = event.confidence,
            fallback = event.fallback,
            total = event.total,
            "search event"
        );
    }
}

/// Durable destination of search events.
#[async_trait]
pub trait SearchEventStore: Send + Sync {
    async fn save(&self, event: &SearchEvent) -> Result<()>;
}

/// Queues events on an unbounded channel drained by a background task that
/// persists them. Failures are logged and the event dropped.
pub struct EventDispatcher {
    event_tx: mpsc::UnboundedSender<SearchEvent>,
}

impl EventDispatcher {
    /// Spawns the persisting task; must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn SearchEventStore>) -> Self {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SearchEvent>();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if let Err(e) = store.save(&event).await {
                    tracing::warn!(query = %event.original_query, "dropping search event: {:#}", e);
                }
            }
        });
        Self { event_tx }
    }
}

impl SearchEventSink for EventDispatcher {
    fn record(&self, event: SearchEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("search event worker has stopped, event dropped");
        }
    }
}
