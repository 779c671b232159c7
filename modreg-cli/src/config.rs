use modreg_core::{ModRegError, Result, StorageBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub archive_format: Option<String>,
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
    pub s3: Option<S3Config>,
    pub filesystem: Option<FilesystemConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Filesystem,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Filesystem => "filesystem",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default)]
    pub conditional_put: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    pub root: PathBuf,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("MODREG").separator("__"))
            .build()
            .map_err(|e| ModRegError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ModRegError::Config(e.to_string()))?;

        Ok(config)
    }
}

impl StorageConfig {
    pub fn storage_builder(&self) -> Result<StorageBuilder> {
        let mut builder = StorageBuilder::new().backend(self.backend.as_str());

        if let Some(prefix) = &self.prefix {
            builder = builder.prefix(prefix);
        }
        if let Some(format) = &self.archive_format {
            builder = builder.archive_format(format);
        }
        if let Some(secs) = self.operation_timeout_secs {
            builder = builder.operation_timeout(Duration::from_secs(secs));
        }

        match self.backend {
            StorageBackend::S3 => {
                let s3 = self.s3.as_ref().ok_or_else(|| {
                    ModRegError::Config("s3 configuration is required for s3 backend".to_string())
                })?;

                builder = builder
                    .bucket(&s3.bucket)
                    .path_style(s3.path_style)
                    .allow_http(s3.allow_http)
                    .conditional_put(s3.conditional_put)
                    .request_timeout(Duration::from_secs(s3.request_timeout_secs))
                    .connect_timeout(Duration::from_secs(s3.connect_timeout_secs));

                if let Some(region) = &s3.region {
                    builder = builder.region(region);
                }
                if let Some(endpoint) = &s3.endpoint {
                    builder = builder.endpoint(endpoint);
                }
            }
            StorageBackend::Filesystem => {
                let filesystem = self.filesystem.as_ref().ok_or_else(|| {
                    ModRegError::Config(
                        "filesystem configuration is required for filesystem backend".to_string(),
                    )
                })?;
                builder = builder.root(&filesystem.root);
            }
            StorageBackend::Memory => {}
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_s3_config() {
        let file = write_config(
            r#"
storage:
  backend: s3
  prefix: modules
  archive_format: zip
  s3:
    bucket: registry
    endpoint: http://localhost:9000
    path_style: true
"#,
        );

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.prefix.as_deref(), Some("modules"));

        let s3 = config.storage.s3.as_ref().unwrap();
        assert_eq!(s3.bucket, "registry");
        assert!(s3.path_style);
        assert!(!s3.conditional_put);
        assert_eq!(s3.region, None);
        assert_eq!(s3.request_timeout_secs, 60);
        assert_eq!(s3.connect_timeout_secs, 10);

        assert!(config.storage.storage_builder().is_ok());
    }

    #[test]
    fn test_missing_backend_section() {
        let file = write_config(
            r#"
storage:
  backend: filesystem
"#,
        );

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        let err = config.storage.storage_builder().unwrap_err();
        assert!(err.to_string().contains("filesystem configuration is required"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let file = write_config(
            r#"
storage:
  backend: gcs
"#,
        );

        assert!(Config::from_file(file.path().to_str().unwrap()).is_err());
    }
}
