//! Storage modules for Modreg
//!
//! Defines the backend-agnostic `Storage` contract and its object-store
//! backed implementation.

pub mod factory;
pub mod key;
pub mod location;
pub mod object_backend;
pub mod region;

pub use factory::StorageBuilder;
pub use key::{
    DEFAULT_ARCHIVE_FORMAT, KeyMetadata, parse_storage_path, storage_path, storage_prefix,
    validate_identity, validate_module,
};
pub use location::DownloadLocation;
pub use object_backend::ObjectStoreStorage;
pub use region::RegionLookup;

use crate::{Module, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Contract consumed by the registry API layer.
///
/// Implementations are shared across concurrent requests, so they must be
/// `Send + Sync` and hold no per-call mutable state.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the module stored for the given identity, or
    /// [`ModRegError::NotFound`](crate::ModRegError::NotFound).
    async fn get_module(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
    ) -> Result<Module>;

    /// Lists every stored version of a module. Order is unspecified.
    async fn list_module_versions(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
    ) -> Result<Vec<Module>>;

    /// Stores a new module version and returns it as read back from the backend.
    async fn upload_module(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
        content: Bytes,
    ) -> Result<Module>;

    /// Whether duplicate uploads are rejected by a single conditional write.
    /// When false, two concurrent uploads of the same identity can both succeed.
    fn supports_conditional_write(&self) -> bool;
}
