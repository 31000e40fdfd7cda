//! Saved game configuration management

mod service;

pub use service::ConfigService;
