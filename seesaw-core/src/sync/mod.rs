//! Dual-backend persistence: primary-store coordination and best-effort
//! secondary mirroring

mod coordinator;
mod http;
mod remote;

pub use coordinator::SyncCoordinator;
pub use http::HttpRemoteSync;
pub use remote::{MockRemoteSync, RemotePush, RemoteSync};
