use docstore_blob::{BlobClient, BlobError};
use docstore_types::{ObjectType, Timestamped};
use tracing::error;

use crate::codec;
use crate::error::{StorageError, StorageResult};
use crate::keys::KeyBuilder;

/// Reads the current revision of a document, or its history.
pub struct VersionReader<'a, C: ?Sized> {
    client: &'a C,
    bucket: &'a str,
    keys: &'a KeyBuilder,
    versioning: bool,
}

impl<'a, C: BlobClient + ?Sized> VersionReader<'a, C> {
    /// `versioning` is the configured setting; history is only consulted when
    /// it is on and the client supports versions.
    pub fn new(client: &'a C, bucket: &'a str, keys: &'a KeyBuilder, versioning: bool) -> Self {
        Self {
            client,
            bucket,
            keys,
            versioning,
        }
    }

    fn history_available(&self) -> bool {
        self.versioning && self.client.supports_versioning()
    }

    /// The current document, stamped with its blob's last-modified time.
    pub fn load_current<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
    ) -> StorageResult<T> {
        let key = self.backend_key(object_type, object_key);
        self.fetch(&key, None).map_err(|e| match e {
            StorageError::Backend(BlobError::NoSuchKey { .. }) => StorageError::NotFound {
                object_type,
                key: object_key.to_string(),
            },
            other => other,
        })
    }

    /// Up to `max_results` revisions, newest first.
    ///
    /// `max_results == 1` is answered from the current object without
    /// touching the version index, as is every request when history is
    /// unavailable. An empty index yields an empty vector; a failed listing
    /// or a revision that cannot be read is an error, never a shorter list.
    pub fn load_versions<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
        max_results: usize,
    ) -> StorageResult<Vec<T>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }
        if max_results == 1 || !self.history_available() {
            return Ok(vec![self.load_current(object_type, object_key)?]);
        }

        let key = self.backend_key(object_type, object_key);
        let summaries = self
            .client
            .list_versions(self.bucket, &key, max_results)
            .map_err(|source| {
                error!(
                    group = object_type.group(),
                    key = %object_key,
                    error = %source,
                    "listing versions failed"
                );
                StorageError::VersionsUnavailable {
                    key: key.clone(),
                    source,
                }
            })?;

        summaries
            .iter()
            // The listing is prefix-scoped; keep only this exact key.
            .filter(|s| s.key == key && !s.is_delete_marker)
            .map(|s| {
                self.fetch(&key, Some(&s.version_id))
                    .map_err(|source| StorageError::VersionFetch {
                        key: key.clone(),
                        version_id: s.version_id.clone(),
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    fn backend_key(&self, object_type: ObjectType, object_key: &str) -> String {
        self.keys.backend_key(
            object_type.group(),
            object_key,
            object_type.default_metadata_filename(),
        )
    }

    fn fetch<T: Timestamped>(&self, key: &str, version_id: Option<&str>) -> StorageResult<T> {
        let object = self.client.get_object(self.bucket, key, version_id)?;
        let mut item: T = codec::deserialize(key, &object.content)?;
        item.set_last_modified(object.metadata.last_modified.timestamp_millis());
        Ok(item)
    }
}
