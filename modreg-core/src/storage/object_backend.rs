use super::Storage;
use super::key::{
    DEFAULT_ARCHIVE_FORMAT, parse_storage_path, storage_path, storage_prefix, validate_identity,
    validate_module,
};
use super::location::DownloadLocation;
use crate::{ModRegError, Module, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutMode, PutOptions, PutPayload};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// `Storage` over any [`ObjectStore`].
///
/// The store and its connection pool are shared by every call; the backend
/// itself only carries read-only settings.
#[derive(Debug, Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    location: DownloadLocation,
    prefix: String,
    archive_format: String,
    conditional_put: bool,
    operation_timeout: Option<Duration>,
}

impl ObjectStoreStorage {
    pub fn new(store: Arc<dyn ObjectStore>, location: DownloadLocation) -> Self {
        Self {
            store,
            location,
            prefix: String::new(),
            archive_format: DEFAULT_ARCHIVE_FORMAT.to_string(),
            conditional_put: false,
            operation_timeout: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_archive_format(mut self, archive_format: impl Into<String>) -> Self {
        self.archive_format = archive_format.into();
        self
    }

    /// Use `PutMode::Create` for uploads. Only enable for stores that honor it.
    pub fn with_conditional_put(mut self, conditional_put: bool) -> Self {
        self.conditional_put = conditional_put;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn archive_format(&self) -> &str {
        &self.archive_format
    }

    pub fn location(&self) -> &DownloadLocation {
        &self.location
    }

    async fn probe(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
    ) -> Result<Module> {
        let key = storage_path(
            &self.prefix,
            namespace,
            name,
            provider,
            version,
            &self.archive_format,
        );
        let path = object_path(&key)?;

        let meta = self
            .bounded("head", &key, async {
                self.store.head(&path).await.map_err(|error| match error {
                    object_store::Error::NotFound { .. } => {
                        ModRegError::NotFound(format!("{}: {}", key, error))
                    }
                    other => ModRegError::Storage(format!("head {}: {}", key, other)),
                })
            })
            .await?;

        Ok(self.module_from_meta(namespace, name, provider, version, &key, &meta))
    }

    async fn write_archive(&self, key: &str, path: &Path, content: Bytes) -> Result<()> {
        let payload = PutPayload::from(content);

        if self.conditional_put {
            return self
                .bounded("put", key, async {
                    self.store
                        .put_opts(path, payload, PutOptions::from(PutMode::Create))
                        .await
                        .map(|_| ())
                        .map_err(|error| match error {
                            object_store::Error::AlreadyExists { .. }
                            | object_store::Error::Precondition { .. } => {
                                ModRegError::AlreadyExists(key.to_string())
                            }
                            other => ModRegError::UploadFailed(format!("{}: {}", key, other)),
                        })
                })
                .await;
        }

        self.bounded("put", key, async {
            self.store
                .put(path, payload)
                .await
                .map(|_| ())
                .map_err(|error| ModRegError::UploadFailed(format!("{}: {}", key, error)))
        })
        .await
    }

    fn module_from_meta(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
        key: &str,
        meta: &ObjectMeta,
    ) -> Module {
        Module {
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            version: version.to_string(),
            download_url: self.location.url_for(key),
            size_bytes: meta.size as u64,
            last_modified: meta.last_modified,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, key: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| {
                ModRegError::Timeout(format!("{} {} exceeded {:?}", operation, key, limit))
            })?,
            None => future.await,
        }
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    async fn get_module(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
    ) -> Result<Module> {
        validate_identity(namespace, name, provider, version)?;
        self.probe(namespace, name, provider, version).await
    }

    async fn list_module_versions(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
    ) -> Result<Vec<Module>> {
        validate_module(namespace, name, provider)?;

        let prefix = storage_prefix(&self.prefix, namespace, name, provider);
        let prefix_path = object_path(&prefix)?;

        self.bounded("list", &prefix, async {
            let mut stream = self.store.list(Some(&prefix_path));
            let mut modules = Vec::new();

            while let Some(entry) = stream.next().await {
                let meta = entry
                    .map_err(|error| ModRegError::ListFailed(format!("{}: {}", prefix, error)))?;
                let key = meta.location.to_string();

                let Some(metadata) = parse_storage_path(&self.prefix, &key, &self.archive_format)
                else {
                    tracing::debug!("Skipping unrecognized object under {}: {}", prefix, key);
                    continue;
                };

                modules.push(self.module_from_meta(
                    &metadata.namespace,
                    &metadata.name,
                    &metadata.provider,
                    &metadata.version,
                    &key,
                    &meta,
                ));
            }

            Ok(modules)
        })
        .await
    }

    async fn upload_module(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
        version: &str,
        content: Bytes,
    ) -> Result<Module> {
        validate_identity(namespace, name, provider, version)?;

        let key = storage_path(
            &self.prefix,
            namespace,
            name,
            provider,
            version,
            &self.archive_format,
        );
        let path = object_path(&key)?;

        if !self.conditional_put {
            match self.probe(namespace, name, provider, version).await {
                Ok(_) => return Err(ModRegError::AlreadyExists(key)),
                Err(ModRegError::NotFound(_)) => {}
                Err(error) => return Err(error),
            }
        }

        let size = content.len();
        self.write_archive(&key, &path, content).await?;
        tracing::info!("Uploaded module archive {} ({} bytes)", key, size);

        self.probe(namespace, name, provider, version).await
    }

    fn supports_conditional_write(&self) -> bool {
        self.conditional_put
    }
}

fn object_path(key: &str) -> Result<Path> {
    Path::parse(key).map_err(|error| {
        ModRegError::Validation(format!("invalid storage key '{}': {}", key, error))
    })
}
