//! Modreg Core - storage layer for a module registry
//!
//! Stores versioned module archives in an object store:
//! - one object per `(namespace, name, provider, version)`
//! - identity recovered from the object key on every read
//! - duplicate uploads rejected, by conditional put where the backend allows it

pub mod error;
pub mod module;
pub mod storage;

pub use error::{ModRegError, Result};
pub use module::Module;
pub use storage::{
    DEFAULT_ARCHIVE_FORMAT, DownloadLocation, KeyMetadata, ObjectStoreStorage, RegionLookup,
    Storage, StorageBuilder, parse_storage_path, storage_path, storage_prefix, validate_identity,
    validate_module,
};
