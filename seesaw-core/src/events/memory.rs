//! In-memory EventSink implementations

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SyncEvent;
use super::sink::EventSink;

/// EventSink that stores events in a Vec for inspection.
///
/// Used by tests and by hosts that poll for absorbed sync failures.
#[derive(Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<SyncEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all published events, oldest first
    pub async fn events(&self) -> Vec<SyncEvent> {
        self.events.read().await.clone()
    }

    /// Events matching a predicate
    pub async fn events_where<F>(&self, predicate: F) -> Vec<SyncEvent>
    where
        F: Fn(&SyncEvent) -> bool,
    {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn publish(&self, event: SyncEvent) {
        self.events.write().await.push(event);
    }
}

/// EventSink that discards everything
#[derive(Debug, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn publish(&self, _event: SyncEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_sink_records_events_in_order() {
        let sink = MemoryEventSink::new();
        sink.publish(SyncEvent::ConfigSaved {
            config_id: "c1".into(),
        })
        .await;
        sink.publish(SyncEvent::ConfigDeleted {
            config_id: "c1".into(),
        })
        .await;

        let events = sink.events().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SyncEvent::ConfigSaved { .. }));
        assert!(matches!(events[1], SyncEvent::ConfigDeleted { .. }));
    }

    #[tokio::test]
    async fn memory_sink_filters_events() {
        let sink = MemoryEventSink::new();
        sink.publish(SyncEvent::ConfigSaved {
            config_id: "c1".into(),
        })
        .await;
        sink.publish(SyncEvent::RemoteSyncFailed {
            operation: "push_config".into(),
            reason: "timeout".into(),
        })
        .await;

        let failures = sink
            .events_where(|e| matches!(e, SyncEvent::RemoteSyncFailed { .. }))
            .await;
        assert_eq!(failures.len(), 1);
    }

    #[tokio::test]
    async fn null_sink_discards_events() {
        let sink = NullEventSink;
        sink.publish(SyncEvent::ConfigSaved {
            config_id: "c1".into(),
        })
        .await;
    }
}
