//! Object key layout for module archives.
//!
//! Archives live at `<prefix>/<namespace>/<name>/<provider>/<name>-<version>.<format>`.
//! Listings only return keys, so every identity field has to be recoverable
//! from the key alone.

use crate::{ModRegError, Result};

pub const DEFAULT_ARCHIVE_FORMAT: &str = "tar.gz";

/// Identity fields recovered from an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub version: String,
}

/// Directory that holds every version of one module.
pub fn storage_prefix(prefix: &str, namespace: &str, name: &str, provider: &str) -> String {
    let prefix = normalize_prefix(prefix);
    if prefix.is_empty() {
        format!("{}/{}/{}", namespace, name, provider)
    } else {
        format!("{}/{}/{}/{}", prefix, namespace, name, provider)
    }
}

pub fn storage_path(
    prefix: &str,
    namespace: &str,
    name: &str,
    provider: &str,
    version: &str,
    archive_format: &str,
) -> String {
    format!(
        "{}/{}-{}.{}",
        storage_prefix(prefix, namespace, name, provider),
        name,
        version,
        archive_format
    )
}

/// Reverse of [`storage_path`]. Returns `None` for keys that were not written
/// under `prefix` with `archive_format`.
pub fn parse_storage_path(prefix: &str, key: &str, archive_format: &str) -> Option<KeyMetadata> {
    let prefix = normalize_prefix(prefix);
    let relative = if prefix.is_empty() {
        key
    } else {
        key.strip_prefix(prefix)?.strip_prefix('/')?
    };

    let segments: Vec<&str> = relative.split('/').collect();
    let [namespace, name, provider, file_name] = segments.as_slice() else {
        return None;
    };

    if namespace.is_empty() || name.is_empty() || provider.is_empty() {
        return None;
    }

    let version = file_name
        .strip_prefix(*name)?
        .strip_prefix('-')?
        .strip_suffix(archive_format)?
        .strip_suffix('.')?;

    if version.is_empty() {
        return None;
    }

    Some(KeyMetadata {
        namespace: namespace.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        version: version.to_string(),
    })
}

/// Checks that every identity field is usable as a single key segment.
pub fn validate_identity(namespace: &str, name: &str, provider: &str, version: &str) -> Result<()> {
    validate_module(namespace, name, provider)?;
    validate_segment("version", version)
}

/// Same checks as [`validate_identity`] for the version-less module prefix.
pub fn validate_module(namespace: &str, name: &str, provider: &str) -> Result<()> {
    validate_segment("namespace", namespace)?;
    validate_segment("name", name)?;
    validate_segment("provider", provider)
}

fn validate_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ModRegError::Validation(format!("{} not defined", field)));
    }

    if value.contains('/') || value == "." || value == ".." {
        return Err(ModRegError::Validation(format!(
            "{} '{}' is not a valid key segment",
            field, value
        )));
    }

    Ok(())
}

fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_layout() {
        assert_eq!(
            storage_path("modules", "acme", "vpc", "aws", "1.0.0", "tar.gz"),
            "modules/acme/vpc/aws/vpc-1.0.0.tar.gz"
        );
        assert_eq!(
            storage_path("", "acme", "vpc", "aws", "1.0.0", "zip"),
            "acme/vpc/aws/vpc-1.0.0.zip"
        );
        assert_eq!(
            storage_path("/modules/", "acme", "vpc", "aws", "1.0.0", "zip"),
            "modules/acme/vpc/aws/vpc-1.0.0.zip"
        );
    }

    #[test]
    fn test_parse_storage_path_recovers_identity() {
        let key = storage_path("modules/nested", "acme", "my-vpc", "aws", "2.1.0-rc.1", "tar.gz");
        let metadata = parse_storage_path("modules/nested", &key, "tar.gz").unwrap();

        assert_eq!(metadata.namespace, "acme");
        assert_eq!(metadata.name, "my-vpc");
        assert_eq!(metadata.provider, "aws");
        assert_eq!(metadata.version, "2.1.0-rc.1");
    }

    #[test]
    fn test_parse_storage_path_rejects_foreign_keys() {
        let cases = [
            "modules/acme/vpc/aws/README.md",
            "modules/acme/vpc/aws/vpc-1.0.0.zip",
            "modules/acme/vpc/aws/vpc-.tar.gz",
            "modules/acme/vpc/aws/other-1.0.0.tar.gz",
            "modules/acme/vpc/aws/nested/vpc-1.0.0.tar.gz",
            "elsewhere/acme/vpc/aws/vpc-1.0.0.tar.gz",
            "modulesx/acme/vpc/aws/vpc-1.0.0.tar.gz",
        ];

        for key in cases {
            assert!(
                parse_storage_path("modules", key, "tar.gz").is_none(),
                "expected {} to be rejected",
                key
            );
        }
    }

    #[test]
    fn test_storage_path_is_injective() {
        let identities = [
            ("acme", "vpc", "aws", "1.0.0"),
            ("acme", "vpc", "aws", "1.0.1"),
            ("acme", "vpc", "gcp", "1.0.0"),
            ("acme", "vpc-aws", "aws", "1.0.0"),
            ("acme-vpc", "aws", "aws", "1.0.0"),
            ("acme", "vpc", "aws-1.0.0", "1.0.0"),
        ];

        let mut keys: Vec<String> = identities
            .iter()
            .map(|(ns, n, p, v)| storage_path("modules", ns, n, p, v, "tar.gz"))
            .collect();
        keys.sort();
        keys.dedup();

        assert_eq!(keys.len(), identities.len());
    }

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("acme", "vpc", "aws", "1.0.0").is_ok());

        let err = validate_identity("acme", "", "aws", "1.0.0").unwrap_err();
        assert!(err.to_string().contains("name not defined"));

        let err = validate_identity("acme", "vpc", "aws", "").unwrap_err();
        assert!(err.to_string().contains("version not defined"));

        assert!(matches!(
            validate_identity("acme/evil", "vpc", "aws", "1.0.0"),
            Err(ModRegError::Validation(_))
        ));
        assert!(matches!(
            validate_identity("acme", "vpc", "..", "1.0.0"),
            Err(ModRegError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_module() {
        assert!(validate_module("acme", "vpc", "aws").is_ok());

        let err = validate_module("", "vpc", "aws").unwrap_err();
        assert!(err.to_string().contains("namespace not defined"));

        assert!(matches!(
            validate_module("acme", ".", "aws"),
            Err(ModRegError::Validation(_))
        ));
    }
}
