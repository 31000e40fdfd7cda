//! EventSink trait definition

use async_trait::async_trait;

use super::SyncEvent;

/// Destination for sync observability events.
///
/// Publishing is infallible by design: a host that cannot accept an event
/// drops it, the same way the coordinator drops secondary-store failures.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish an event
    async fn publish(&self, event: SyncEvent);
}
