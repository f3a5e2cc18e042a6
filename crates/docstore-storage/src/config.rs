use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Page size used for listings when `max_keys` is not configured.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Errors loading or validating a [`StorageConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for a blob-backed storage service.
///
/// Keys may be written in snake_case or in the camelCase used by older
/// property files (`bucketName`, `rootFolder`, `maxKeys`, ...).
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    #[serde(alias = "bucketName")]
    pub bucket_name: String,
    /// Folder prefix under which every object type gets its own group folder.
    #[serde(default, alias = "rootFolder")]
    pub root_folder: String,
    /// Backend endpoint. The bundled CLI accepts a `file://` URL or a path.
    #[serde(default, alias = "endPoint")]
    pub endpoint: String,
    #[serde(default, alias = "accessKeyId")]
    pub access_key_id: Option<String>,
    #[serde(default, alias = "accessSecretKey")]
    pub access_secret_key: Option<String>,
    /// Listing page size; [`DEFAULT_PAGE_SIZE`] when unset.
    #[serde(default, alias = "maxKeys")]
    pub max_keys: Option<usize>,
    /// Retain object history on buckets this service creates.
    #[serde(default = "default_versioning")]
    pub versioning: bool,
}

fn default_versioning() -> bool {
    true
}

impl StorageConfig {
    /// Config for `bucket_name` with every other setting at its default.
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            root_folder: String::new(),
            endpoint: String::new(),
            access_key_id: None,
            access_secret_key: None,
            max_keys: None,
            versioning: true,
        }
    }

    pub fn with_root_folder(mut self, root_folder: impl Into<String>) -> Self {
        self.root_folder = root_folder.into();
        self
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    pub fn with_versioning(mut self, versioning: bool) -> Self {
        self.versioning = versioning;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_name.trim().is_empty() {
            return Err(ConfigError::Invalid("bucket_name must not be empty".into()));
        }
        if self.max_keys == Some(0) {
            return Err(ConfigError::Invalid("max_keys must be positive".into()));
        }
        Ok(())
    }

    /// Effective listing page size.
    pub fn page_size(&self) -> usize {
        self.max_keys.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket_name", &self.bucket_name)
            .field("root_folder", &self.root_folder)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "access_secret_key",
                &self.access_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("max_keys", &self.max_keys)
            .field("versioning", &self.versioning)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = StorageConfig::from_toml_str(r#"bucket_name = "front""#).unwrap();
        assert_eq!(c.bucket_name, "front");
        assert_eq!(c.root_folder, "");
        assert!(c.versioning);
        assert_eq!(c.max_keys, None);
        assert_eq!(c.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn camel_case_aliases() {
        let c = StorageConfig::from_toml_str(
            r#"
            bucketName = "front"
            rootFolder = "apps"
            endPoint = "file:///tmp/blobs"
            accessKeyId = "id"
            accessSecretKey = "secret"
            maxKeys = 100
            versioning = false
            "#,
        )
        .unwrap();
        assert_eq!(c.root_folder, "apps");
        assert_eq!(c.endpoint, "file:///tmp/blobs");
        assert_eq!(c.page_size(), 100);
        assert!(!c.versioning);
    }

    #[test]
    fn rejects_empty_bucket() {
        let err = StorageConfig::from_toml_str(r#"bucket_name = "  ""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = StorageConfig::from_toml_str("bucket_name = \"b\"\nmax_keys = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_missing_bucket() {
        let err = StorageConfig::from_toml_str(r#"root_folder = "apps""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstore.toml");
        std::fs::write(&path, "bucket_name = \"front\"\nroot_folder = \"apps\"\n").unwrap();
        let c = StorageConfig::load(&path).unwrap();
        assert_eq!(c, StorageConfig::new("front").with_root_folder("apps"));
    }

    #[test]
    fn load_missing_file() {
        let err = StorageConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn debug_redacts_secret() {
        let mut c = StorageConfig::new("front");
        c.access_secret_key = Some("hunter2".into());
        let debug = format!("{c:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn secret_from_toml_stays_redacted() {
        let c = StorageConfig::from_toml_str(
            "bucketName = \"front\"\naccessKeyId = \"AKID\"\naccessSecretKey = \"hunter2\"\n",
        )
        .unwrap();
        assert_eq!(c.access_secret_key.as_deref(), Some("hunter2"));
        assert!(!format!("{c:?}").contains("hunter2"));
    }
}
