pub mod api;
pub mod registry;

pub use registry::{Entry, MemoryStore, RegistryService, RegistrySettings};
