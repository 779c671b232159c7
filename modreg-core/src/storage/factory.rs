use super::location::DownloadLocation;
use super::object_backend::ObjectStoreStorage;
use super::region::RegionLookup;
use super::{DEFAULT_ARCHIVE_FORMAT, Storage};
use crate::{ModRegError, Result};
use object_store::aws::{AmazonS3Builder, S3ConditionalPut, resolve_bucket_region};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{ClientOptions, ObjectStore, RetryConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StorageBuilder {
    backend: Option<String>,
    prefix: Option<String>,
    archive_format: Option<String>,
    operation_timeout: Option<Duration>,
    bucket: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
    path_style: bool,
    allow_http: bool,
    conditional_put: bool,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    root: Option<PathBuf>,
}

impl StorageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `s3`, `filesystem` or `memory`.
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Archive extension used for both reads and uploads. Defaults to `tar.gz`.
    pub fn archive_format(mut self, archive_format: impl Into<String>) -> Self {
        self.archive_format = Some(archive_format.into());
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Bucket region. Discovered from the bucket when left unset.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Endpoint for S3-compatible services. Empty means the AWS default.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    pub fn allow_http(mut self, allow_http: bool) -> Self {
        self.allow_http = allow_http;
        self
    }

    /// Reject duplicate S3 uploads with `If-None-Match` instead of a
    /// head-then-put sequence. The endpoint must support conditional writes.
    pub fn conditional_put(mut self, conditional_put: bool) -> Self {
        self.conditional_put = conditional_put;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve_backend(&self) -> Result<String> {
        let backend = self
            .backend
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if backend.is_empty() {
            return Err(ModRegError::Config(
                "storage backend cannot be empty".to_string(),
            ));
        }

        Ok(backend)
    }

    fn resolve_archive_format(&self) -> Result<String> {
        let format = self
            .archive_format
            .as_deref()
            .map(str::trim)
            .map(|value| value.trim_start_matches('.'))
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ARCHIVE_FORMAT);

        if format.contains('/') {
            return Err(ModRegError::Config(format!(
                "archive format '{}' cannot contain '/'",
                format
            )));
        }

        Ok(format.to_string())
    }

    fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::new().with_allow_http(self.allow_http);
        if let Some(timeout) = self.request_timeout {
            options = options.with_timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            options = options.with_connect_timeout(timeout);
        }
        options
    }

    /// Failures surface on the first attempt; retry policy belongs to callers.
    fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: 0,
            ..Default::default()
        }
    }

    fn region_lookup(&self) -> RegionLookup {
        RegionLookup {
            allow_http: self.allow_http,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }

    pub async fn build(&self) -> Result<Arc<dyn Storage>> {
        let storage = self.build_object_store_storage().await?;
        Ok(Arc::new(storage))
    }

    pub async fn build_object_store_storage(&self) -> Result<ObjectStoreStorage> {
        let backend = self.resolve_backend()?;
        let archive_format = self.resolve_archive_format()?;

        let (store, location, conditional_put) = match backend.as_str() {
            "s3" => self.build_s3().await?,
            "filesystem" => self.build_filesystem()?,
            "memory" => (
                Arc::new(InMemory::new()) as Arc<dyn ObjectStore>,
                DownloadLocation::Memory,
                true,
            ),
            other => {
                return Err(ModRegError::Config(format!(
                    "unsupported storage backend: {}",
                    other
                )));
            }
        };

        let prefix = self.prefix.as_deref().unwrap_or_default().trim_matches('/');

        let storage = ObjectStoreStorage::new(store, location)
            .with_prefix(prefix)
            .with_archive_format(archive_format)
            .with_conditional_put(conditional_put)
            .with_operation_timeout(self.operation_timeout);

        tracing::info!(
            "Storage ready: backend={} prefix={} archive_format={} conditional_put={} location={:?}",
            backend,
            storage.prefix(),
            storage.archive_format(),
            storage.supports_conditional_write(),
            storage.location()
        );

        Ok(storage)
    }

    async fn build_s3(&self) -> Result<(Arc<dyn ObjectStore>, DownloadLocation, bool)> {
        let bucket = self.bucket.as_deref().unwrap_or_default().trim();
        if bucket.is_empty() {
            return Err(ModRegError::Config(
                "bucket is required for s3 backend".to_string(),
            ));
        }

        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let client_options = self.client_options();

        let configured_region = self
            .region
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let region = match (configured_region, endpoint.as_deref()) {
            (Some(region), _) => region.to_string(),
            (None, Some(endpoint)) => {
                let bucket_url = if self.path_style {
                    format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
                } else {
                    virtual_hosted_endpoint(bucket, endpoint)
                };
                self.region_lookup().discover(bucket, &bucket_url).await?
            }
            (None, None) => resolve_bucket_region(bucket, &client_options)
                .await
                .map_err(|error| {
                    ModRegError::Config(format!(
                        "failed to determine bucket region for {}: {}",
                        bucket, error
                    ))
                })?,
        };

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&region)
            .with_allow_http(self.allow_http)
            .with_client_options(client_options)
            .with_retry(self.retry_config());

        builder = match endpoint.as_deref() {
            Some(endpoint) if self.path_style => builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false),
            Some(endpoint) => builder
                .with_endpoint(virtual_hosted_endpoint(bucket, endpoint))
                .with_virtual_hosted_style_request(true),
            None => builder.with_virtual_hosted_style_request(!self.path_style),
        };

        if self.conditional_put {
            builder = builder.with_conditional_put(S3ConditionalPut::ETagMatch);
        }

        let store = builder
            .build()
            .map_err(|error| ModRegError::Config(format!("S3: {}", error)))?;

        tracing::debug!("S3 storage for bucket {} in region {}", bucket, region);

        let location = DownloadLocation::S3 {
            bucket: bucket.to_string(),
            region,
            endpoint,
            path_style: self.path_style,
        };

        Ok((
            Arc::new(store) as Arc<dyn ObjectStore>,
            location,
            self.conditional_put,
        ))
    }

    fn build_filesystem(&self) -> Result<(Arc<dyn ObjectStore>, DownloadLocation, bool)> {
        let root = self.root.clone().ok_or_else(|| {
            ModRegError::Config("root is required for filesystem backend".to_string())
        })?;

        if root.as_os_str().is_empty() {
            return Err(ModRegError::Config(
                "root cannot be empty for filesystem backend".to_string(),
            ));
        }

        std::fs::create_dir_all(&root).map_err(|error| {
            ModRegError::Config(format!(
                "failed to create storage directory '{}': {}",
                root.display(),
                error
            ))
        })?;

        let root = root.canonicalize().map_err(|error| {
            ModRegError::Config(format!(
                "failed to resolve storage directory '{}': {}",
                root.display(),
                error
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|error| ModRegError::Config(format!("LocalFileSystem: {}", error)))?;

        Ok((
            Arc::new(store) as Arc<dyn ObjectStore>,
            DownloadLocation::Filesystem { root },
            true,
        ))
    }
}

fn virtual_hosted_endpoint(bucket: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    match endpoint.split_once("://") {
        Some((scheme, host)) => format!("{}://{}.{}", scheme, bucket, host),
        None => format!("https://{}.{}", bucket, endpoint),
    }
}
