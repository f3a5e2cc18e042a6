use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::checksum::{md5_hex, verify_content_md5};
use crate::error::{BlobError, BlobResult};
use crate::model::{
    BlobMetadata, BlobObject, BucketInfo, CreateBucketRequest, ListObjectsRequest, ObjectListing,
    ObjectSummary, PutMetadata, PutReceipt, VersionSummary,
};
use crate::traits::BlobClient;

/// Version id reported for objects in buckets without versioning.
const NULL_VERSION: &str = "null";

/// A [`BlobClient`] operation, used to count calls and inject failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    HeadBucket,
    CreateBucket,
    EnableVersioning,
    GetObject,
    PutObject,
    DeleteObject,
    ListObjects,
    ListVersions,
}

#[derive(Clone, Debug)]
struct Revision {
    version_id: String,
    content: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
    delete_marker: bool,
}

impl Revision {
    fn to_object(&self, versioned: bool) -> BlobObject {
        BlobObject {
            content: self.content.clone(),
            metadata: BlobMetadata {
                last_modified: self.last_modified,
                content_length: self.content.len() as u64,
                etag: self.etag.clone(),
                version_id: versioned.then(|| self.version_id.clone()),
            },
        }
    }
}

struct Bucket {
    info: BucketInfo,
    /// Revisions per key, oldest first.
    objects: BTreeMap<String, Vec<Revision>>,
}

impl Bucket {
    fn current(&self, key: &str) -> Option<&Revision> {
        self.objects
            .get(key)
            .and_then(|revs| revs.last())
            .filter(|rev| !rev.delete_marker)
    }
}

/// In-memory, versioning-capable blob store.
///
/// Intended for tests and embedding. Buckets live behind a `RwLock`; content
/// is shared through `Bytes` so reads do not copy. Every call is counted per
/// [`Operation`], and any operation can be made to fail on demand with
/// [`InMemoryBlobClient::fail`].
pub struct InMemoryBlobClient {
    buckets: RwLock<HashMap<String, Bucket>>,
    calls: RwLock<HashMap<Operation, usize>>,
    failing: RwLock<HashSet<Operation>>,
    failing_keys: RwLock<HashSet<String>>,
}

impl InMemoryBlobClient {
    /// Create a client with no buckets.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            calls: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            failing_keys: RwLock::new(HashSet::new()),
        }
    }

    /// Create a client that already holds one bucket.
    pub fn with_bucket(name: &str, versioned: bool) -> Self {
        let client = Self::new();
        client
            .buckets
            .write()
            .expect("lock poisoned")
            .insert(name.to_string(), Self::new_bucket(name, versioned));
        client
    }

    fn new_bucket(name: &str, versioned: bool) -> Bucket {
        Bucket {
            info: BucketInfo {
                name: name.to_string(),
                storage_class: Default::default(),
                versioning_enabled: versioned,
                created: Utc::now(),
            },
            objects: BTreeMap::new(),
        }
    }

    /// Number of calls made for `op` since creation or the last reset.
    pub fn calls(&self, op: Operation) -> usize {
        self.calls
            .read()
            .expect("lock poisoned")
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Zero all call counters.
    pub fn reset_calls(&self) {
        self.calls.write().expect("lock poisoned").clear();
    }

    /// Make every subsequent `op` call fail with a service error.
    pub fn fail(&self, op: Operation) {
        self.failing.write().expect("lock poisoned").insert(op);
    }

    /// Undo [`fail`](Self::fail) for `op`.
    pub fn heal(&self, op: Operation) {
        self.failing.write().expect("lock poisoned").remove(&op);
    }

    /// Make every subsequent `put_object` to exactly `key` fail with a
    /// service error, leaving writes to other keys untouched.
    pub fn fail_key(&self, key: &str) {
        self.failing_keys
            .write()
            .expect("lock poisoned")
            .insert(key.to_string());
    }

    /// Sorted keys of the current (non-deleted) objects in a bucket.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let map = self.buckets.read().expect("lock poisoned");
        map.get(bucket)
            .map(|b| {
                b.objects
                    .keys()
                    .filter(|k| b.current(k).is_some())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Revisions retained for a key, including delete markers.
    pub fn revision_count(&self, bucket: &str, key: &str) -> usize {
        let map = self.buckets.read().expect("lock poisoned");
        map.get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn track(&self, op: Operation) -> BlobResult<()> {
        *self
            .calls
            .write()
            .expect("lock poisoned")
            .entry(op)
            .or_insert(0) += 1;
        if self.failing.read().expect("lock poisoned").contains(&op) {
            return Err(BlobError::Service {
                code: "InjectedFailure".into(),
                message: format!("{op:?} failed"),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryBlobClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobClient for InMemoryBlobClient {
    fn head_bucket(&self, bucket: &str) -> BlobResult<BucketInfo> {
        self.track(Operation::HeadBucket)?;
        let map = self.buckets.read().expect("lock poisoned");
        map.get(bucket)
            .map(|b| b.info.clone())
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))
    }

    fn create_bucket(&self, request: &CreateBucketRequest) -> BlobResult<()> {
        self.track(Operation::CreateBucket)?;
        let mut map = self.buckets.write().expect("lock poisoned");
        if map.contains_key(&request.name) {
            return Err(BlobError::BucketAlreadyExists(request.name.clone()));
        }
        let mut bucket = Self::new_bucket(&request.name, false);
        bucket.info.storage_class = request.storage_class;
        map.insert(request.name.clone(), bucket);
        Ok(())
    }

    fn enable_versioning(&self, bucket: &str) -> BlobResult<()> {
        self.track(Operation::EnableVersioning)?;
        let mut map = self.buckets.write().expect("lock poisoned");
        let b = map
            .get_mut(bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))?;
        b.info.versioning_enabled = true;
        Ok(())
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> BlobResult<BlobObject> {
        self.track(Operation::GetObject)?;
        let map = self.buckets.read().expect("lock poisoned");
        let b = map
            .get(bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))?;
        let versioned = b.info.versioning_enabled;

        match version_id {
            None => b
                .current(key)
                .map(|rev| rev.to_object(versioned))
                .ok_or_else(|| BlobError::NoSuchKey {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }),
            Some(wanted) => b
                .objects
                .get(key)
                .and_then(|revs| revs.iter().find(|rev| rev.version_id == wanted))
                .filter(|rev| !rev.delete_marker)
                .map(|rev| rev.to_object(versioned))
                .ok_or_else(|| BlobError::NoSuchVersion {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    version_id: wanted.to_string(),
                }),
        }
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: &PutMetadata,
    ) -> BlobResult<PutReceipt> {
        self.track(Operation::PutObject)?;
        if self.failing_keys.read().expect("lock poisoned").contains(key) {
            return Err(BlobError::Service {
                code: "InjectedFailure".into(),
                message: format!("PutObject to {key} failed"),
            });
        }
        if key.is_empty() {
            return Err(BlobError::InvalidRequest("empty object key".into()));
        }
        if metadata.content_length != body.len() as u64 {
            return Err(BlobError::InvalidRequest(format!(
                "content length {} does not match body of {} bytes",
                metadata.content_length,
                body.len()
            )));
        }
        verify_content_md5(&body, &metadata.content_md5).map_err(|computed| {
            BlobError::BadDigest {
                expected: metadata.content_md5.clone(),
                computed,
            }
        })?;

        let mut map = self.buckets.write().expect("lock poisoned");
        let b = map
            .get_mut(bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))?;
        let versioned = b.info.versioning_enabled;
        let revision = Revision {
            version_id: if versioned {
                Uuid::now_v7().to_string()
            } else {
                NULL_VERSION.to_string()
            },
            etag: md5_hex(&body),
            content: body,
            last_modified: Utc::now(),
            delete_marker: false,
        };
        let receipt = PutReceipt {
            etag: revision.etag.clone(),
            version_id: versioned.then(|| revision.version_id.clone()),
        };

        let revisions = b.objects.entry(key.to_string()).or_default();
        if !versioned {
            revisions.clear();
        }
        revisions.push(revision);
        Ok(receipt)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> BlobResult<()> {
        self.track(Operation::DeleteObject)?;
        let mut map = self.buckets.write().expect("lock poisoned");
        let b = map
            .get_mut(bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))?;

        if !b.info.versioning_enabled {
            b.objects.remove(key);
            return Ok(());
        }
        // Versioned buckets keep history; hide the key behind a delete marker.
        if b.current(key).is_some() {
            if let Some(revisions) = b.objects.get_mut(key) {
                revisions.push(Revision {
                    version_id: Uuid::now_v7().to_string(),
                    content: Bytes::new(),
                    etag: String::new(),
                    last_modified: Utc::now(),
                    delete_marker: true,
                });
            }
        }
        Ok(())
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> BlobResult<ObjectListing> {
        self.track(Operation::ListObjects)?;
        if request.max_keys == 0 {
            return Err(BlobError::InvalidRequest("max_keys must be positive".into()));
        }
        let map = self.buckets.read().expect("lock poisoned");
        let b = map
            .get(&request.bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(request.bucket.clone()))?;

        let mut page = b
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(&request.prefix))
            .filter(|(key, _)| {
                request
                    .marker
                    .as_deref()
                    .map_or(true, |marker| key.as_str() > marker)
            })
            .filter_map(|(key, _)| {
                b.current(key).map(|rev| ObjectSummary {
                    key: key.clone(),
                    last_modified: rev.last_modified,
                    size: rev.content.len() as u64,
                    etag: rev.etag.clone(),
                })
            })
            .take(request.max_keys + 1)
            .collect::<Vec<_>>();

        let next_marker = if page.len() > request.max_keys {
            page.truncate(request.max_keys);
            page.last().map(|s| s.key.clone())
        } else {
            None
        };
        Ok(ObjectListing {
            summaries: page,
            next_marker,
        })
    }

    fn list_versions(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: usize,
    ) -> BlobResult<Vec<VersionSummary>> {
        self.track(Operation::ListVersions)?;
        let map = self.buckets.read().expect("lock poisoned");
        let b = map
            .get(bucket)
            .ok_or_else(|| BlobError::NoSuchBucket(bucket.to_string()))?;

        Ok(b.objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .flat_map(|(key, revisions)| {
                let newest = revisions.len().saturating_sub(1);
                revisions
                    .iter()
                    .enumerate()
                    .rev()
                    .map(move |(i, rev)| VersionSummary {
                        key: key.clone(),
                        version_id: rev.version_id.clone(),
                        last_modified: rev.last_modified,
                        is_latest: i == newest,
                        is_delete_marker: rev.delete_marker,
                    })
            })
            .take(max_results)
            .collect())
    }

    fn supports_versioning(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for InMemoryBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.buckets.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryBlobClient")
            .field("bucket_count", &count)
            .finish()
    }
}
