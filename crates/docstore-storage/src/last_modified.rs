use docstore_blob::BlobClient;
use docstore_types::ObjectType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::codec;
use crate::error::{StorageError, StorageResult};
use crate::keys::KeyBuilder;

/// Body of a group's `last-modified.json`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastModifiedMarker {
    pub last_modified: i64,
}

/// Keeps one small marker blob per group recording the latest write.
///
/// The marker is advisory. It is written after the document write it
/// follows, as a separate call, so a failure in between leaves it older than
/// the true last write. Use it for cache invalidation, not for correctness.
pub struct LastModifiedTracker<'a, C: ?Sized> {
    client: &'a C,
    bucket: &'a str,
    keys: &'a KeyBuilder,
    clock: &'a dyn Clock,
}

impl<'a, C: BlobClient + ?Sized> LastModifiedTracker<'a, C> {
    pub fn new(client: &'a C, bucket: &'a str, keys: &'a KeyBuilder, clock: &'a dyn Clock) -> Self {
        Self {
            client,
            bucket,
            keys,
            clock,
        }
    }

    /// Record "now" as `group`'s last write. Returns the timestamp written.
    pub fn write_last_modified(&self, group: &str) -> StorageResult<i64> {
        let key = self.keys.last_modified_key(group);
        let marker = LastModifiedMarker {
            last_modified: self.clock.now_millis(),
        };
        let wrap = |source: StorageError| StorageError::MarkerWrite {
            key: key.clone(),
            source: Box::new(source),
        };

        let encoded = codec::serialize(&marker).map_err(wrap)?;
        self.client
            .put_object(self.bucket, &key, encoded.body, &encoded.metadata)
            .map_err(|e| wrap(e.into()))?;
        Ok(marker.last_modified)
    }

    /// Epoch millis of the latest recorded write, or `0` if the marker is
    /// missing or unreadable.
    pub fn get_last_modified(&self, object_type: ObjectType) -> i64 {
        let key = self.keys.last_modified_key(object_type.group());
        let read = self
            .client
            .get_object(self.bucket, &key, None)
            .map_err(StorageError::from)
            .and_then(|obj| codec::deserialize::<LastModifiedMarker>(&key, &obj.content));
        match read {
            Ok(marker) => marker.last_modified,
            Err(e) => {
                debug!(key = %key, error = %e, "no usable last-modified marker");
                0
            }
        }
    }
}
