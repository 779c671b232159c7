//! Bucket region lookup for S3-compatible endpoints.
//!
//! `object_store::aws::resolve_bucket_region` only talks to AWS. For a custom
//! endpoint the bucket is queried directly and the region read back from the
//! `x-amz-bucket-region` response header, which S3 and most compatible
//! services attach to any bucket-level response, including 301/403.

use crate::{ModRegError, Result};
use std::time::Duration;

const BUCKET_REGION_HEADER: &str = "x-amz-bucket-region";

#[derive(Debug, Clone, Default)]
pub struct RegionLookup {
    pub allow_http: bool,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl RegionLookup {
    /// Sends a single `HEAD <bucket_url>` and returns the advertised region.
    pub async fn discover(&self, bucket: &str, bucket_url: &str) -> Result<String> {
        let mut builder = reqwest::Client::builder().https_only(!self.allow_http);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ModRegError::Config(format!("failed to build http client: {}", e)))?;

        let response = client.head(bucket_url).send().await.map_err(|error| {
            ModRegError::Config(format!(
                "failed to determine bucket region for {} at {}: {}",
                bucket, bucket_url, error
            ))
        })?;

        let region = response
            .headers()
            .get(BUCKET_REGION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ModRegError::Config(format!(
                    "failed to determine bucket region for {} at {}: status {} without {} header; set the region explicitly",
                    bucket,
                    bucket_url,
                    response.status(),
                    BUCKET_REGION_HEADER
                ))
            })?;

        tracing::debug!("Discovered region {} for bucket {} at {}", region, bucket, bucket_url);
        Ok(region.to_string())
    }
}
