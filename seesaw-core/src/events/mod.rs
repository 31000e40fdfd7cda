//! Sync observability events

mod memory;
mod sink;
mod types;

pub use memory::{MemoryEventSink, NullEventSink};
pub use sink::EventSink;
pub use types::SyncEvent;
