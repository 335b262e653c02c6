//! MatchMate Library - Headless profile sync for the MatchMate client.
//!
//! This crate is the data synchronization core behind a profile-browsing
//! client: it fetches randomized user records from a remote API, persists
//! them locally, and reconciles re-fetched records against locally-made
//! accept/decline decisions so those decisions survive every sync cycle.
//! It works offline by falling back to the local store and is consumed by
//! a presentation layer; there is no process boundary here.
//!
//! # Example
//!
//! ```rust,ignore
//! use matchmate_library::{
//!     ConnectivityMonitor, HttpFetcher, ProfileStore, SyncEngine,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> matchmate_library::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new()?);
//!     let store = Arc::new(ProfileStore::open("matchmate/profiles.db")?);
//!     let engine = Arc::new(SyncEngine::new(fetcher, store));
//!
//!     let monitor = ConnectivityMonitor::new();
//!     engine.attach_monitor(&monitor);
//!
//!     engine.refresh().await;
//!     for profile in engine.profiles() {
//!         println!("{} ({})", profile.display_name, profile.location_label);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod profiles;

// Re-export commonly used types
pub use config::{ApiConfig, FetcherConfig, NetworkConfig};
pub use error::{MatchError, Result};
pub use network::{
    ConnectivityMonitor, Endpoint, HttpClient, HttpFetcher, MonitorConfig, RemoteFetcher,
    RetryConfig,
};
pub use profiles::{
    EngineState, Profile, ProfileMapper, ProfileStatus, ProfileStore, SyncEngine,
};
