use std::path::PathBuf;

/// Where a backend's objects can be fetched from, used to derive the
/// download URL handed back to registry clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadLocation {
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        path_style: bool,
    },
    Filesystem {
        root: PathBuf,
    },
    Memory,
}

impl DownloadLocation {
    /// Download address for `key`.
    ///
    /// On AWS the registry keeps the scheme-less regional form
    /// `<bucket>.s3-<region>.amazonaws.com/<key>` that clients already resolve.
    /// A custom endpoint has no such hostname: the object is only reachable at
    /// the configured endpoint, so its URL is built from it. Path-style
    /// services (MinIO and most self-hosted ones) serve `<endpoint>/<bucket>/<key>`;
    /// virtual-hosted ones put the bucket in front of the endpoint host and keep
    /// the endpoint's scheme. The region plays no part in either.
    pub fn url_for(&self, key: &str) -> String {
        match self {
            DownloadLocation::S3 {
                bucket,
                region,
                endpoint: None,
                ..
            } => format!("{}.s3-{}.amazonaws.com/{}", bucket, region, key),
            DownloadLocation::S3 {
                bucket,
                endpoint: Some(endpoint),
                path_style: true,
                ..
            } => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
            DownloadLocation::S3 {
                bucket,
                endpoint: Some(endpoint),
                path_style: false,
                ..
            } => {
                let endpoint = endpoint.trim_end_matches('/');
                match endpoint.split_once("://") {
                    Some((scheme, host)) => format!("{}://{}.{}/{}", scheme, bucket, host, key),
                    None => format!("{}.{}/{}", bucket, endpoint, key),
                }
            }
            DownloadLocation::Filesystem { root } => {
                format!("file://{}/{}", root.display().to_string().trim_end_matches('/'), key)
            }
            DownloadLocation::Memory => format!("memory:///{}", key),
        }
    }
}
