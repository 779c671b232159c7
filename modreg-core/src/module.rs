use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored module archive version.
///
/// A `Module` is never persisted on its own; it is rebuilt from the object
/// key and the object metadata every time it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub version: String,
    pub download_url: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

impl Module {
    #[cfg(test)]
    pub(crate) fn identity(&self) -> (&str, &str, &str, &str) {
        (&self.namespace, &self.name, &self.provider, &self.version)
    }
}
