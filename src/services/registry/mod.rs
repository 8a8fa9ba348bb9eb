//! Registry core
//!
//! This module contains the heartbeat registry split into logical components:
//! - `types`: entries, requests, settings and error types
//! - `signature`: HMAC-SHA1 shared-secret verification
//! - `store`: storage trait and the in-memory backend
//! - `service`: list / register / heartbeat with lazy expiry
//! - `cleanup`: optional background sweep
//! - `clock`: injectable time source

pub mod cleanup;
pub mod clock;
pub mod service;
pub mod signature;
pub mod store;
pub mod types;

// Re-export public types for easier access
pub use clock::{Clock, ManualClock, SystemClock};
pub use service::RegistryService;
pub use signature::SignatureValidator;
pub use store::{MemoryStore, RegistryStore};
pub use types::{
    Entry, HeartbeatError, HeartbeatRequest, ListError, RegisterError, RegisterRequest,
    RegistrySettings, StoreError, Success,
};
