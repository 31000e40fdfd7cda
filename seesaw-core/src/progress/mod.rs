//! Progress reads and history reconstruction

mod aggregator;

pub use aggregator::ProgressAggregator;
