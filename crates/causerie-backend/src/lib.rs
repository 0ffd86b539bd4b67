// Capability contracts for the remote collaborators (auth, realtime store,
// blob storage), plus in-process implementations for tests and local runs.

pub mod auth;
pub mod blob_store;
pub mod blobs;
pub mod memory_auth;
pub mod memory_store;
pub mod rate_limit;
pub mod realtime;

pub use auth::{AuthService, AuthUser};
pub use blob_store::LocalBlobStore;
pub use blobs::{BlobHandle, BlobStore};
pub use memory_auth::MemoryAuth;
pub use memory_store::MemoryStore;
pub use rate_limit::RateLimiter;
pub use realtime::{server_timestamp, RealtimeStore, Snapshot, Subscription};
