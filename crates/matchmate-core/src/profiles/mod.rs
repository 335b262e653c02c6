//! Profile domain: entity, wire format, mapping, storage, and sync.

pub mod engine;
pub mod mapper;
pub mod store;
pub mod types;
pub mod wire;

pub use engine::{EngineState, SyncEngine};
pub use mapper::ProfileMapper;
pub use store::ProfileStore;
pub use types::{Profile, ProfileStatus};
pub use wire::{RemoteUserRecord, UserListResponse};
