//! Implementations of the collaborator ports.

pub mod fs;
pub mod memory;

#[cfg(feature = "azure")]
pub mod azure;

pub use fs::LocalObjectStore;
pub use memory::{
    MemoryDocumentRepository, MemoryItemRepository, MemoryObjectStore, MemoryPartyRepository,
};

#[cfg(feature = "azure")]
pub use azure::AzureDocumentClient;
