use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::checksum::{md5_hex, verify_content_md5};
use crate::error::{BlobError, BlobResult};
use crate::model::{
    BlobMetadata, BlobObject, BucketInfo, CreateBucketRequest, ListObjectsRequest, ObjectListing,
    ObjectSummary, PutMetadata, PutReceipt, StorageClass, VersionSummary,
};
use crate::traits::BlobClient;

/// Suffix of in-flight uploads; never reported as an object.
const PARTIAL_SUFFIX: &str = ".docstore-partial";

/// Filesystem-backed blob store.
///
/// Each bucket is a directory under `root` and each object is a file at its
/// key path inside that directory, so a key like
/// `apps/application/app1/application.json` is an ordinary nested file.
/// Uploads are written to a sibling temp file and renamed into place.
///
/// The filesystem keeps no history, so this backend does not support
/// versioning: `list_versions` reports only the current file, under the
/// version id `null`.
#[derive(Clone, Debug)]
pub struct LocalBlobClient {
    root: PathBuf,
}

impl LocalBlobClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding all buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> BlobResult<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(BlobError::InvalidRequest(format!(
                "invalid bucket name: {bucket:?}"
            )));
        }
        Ok(self.root.join(bucket))
    }

    fn existing_bucket_dir(&self, bucket: &str) -> BlobResult<PathBuf> {
        let dir = self.bucket_dir(bucket)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(BlobError::NoSuchBucket(bucket.to_string()))
        }
    }

    /// Resolve a key to a file path, refusing anything that would escape the
    /// bucket directory.
    fn object_path(&self, bucket_dir: &Path, key: &str) -> BlobResult<PathBuf> {
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && !key.ends_with('/')
            && !key.ends_with(PARTIAL_SUFFIX)
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(BlobError::InvalidRequest(format!("invalid object key: {key:?}")));
        }
        Ok(bucket_dir.join(relative))
    }

    /// All current objects in a bucket, sorted by key.
    fn scan(&self, bucket_dir: &Path, prefix: &str) -> BlobResult<Vec<(String, fs::Metadata)>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(bucket_dir).min_depth(1) {
            let entry = entry.map_err(|e| {
                BlobError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "filesystem loop during listing")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(bucket_dir) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.ends_with(PARTIAL_SUFFIX) || !key.starts_with(prefix) {
                continue;
            }
            found.push((key, entry.metadata().map_err(|e| {
                BlobError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "metadata unavailable")
                }))
            })?));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}

/// Remove an abandoned upload. A partial that was never created is fine.
fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %partial.display(), error = %e, "could not remove partial upload"),
    }
}

fn modified_at(meta: &fs::Metadata) -> DateTime<Utc> {
    meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now())
}

impl BlobClient for LocalBlobClient {
    fn head_bucket(&self, bucket: &str) -> BlobResult<BucketInfo> {
        let dir = self.existing_bucket_dir(bucket)?;
        let meta = fs::metadata(&dir)?;
        Ok(BucketInfo {
            name: bucket.to_string(),
            storage_class: StorageClass::Standard,
            versioning_enabled: false,
            created: meta
                .created()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| modified_at(&meta)),
        })
    }

    fn create_bucket(&self, request: &CreateBucketRequest) -> BlobResult<()> {
        let dir = self.bucket_dir(&request.name)?;
        if dir.exists() {
            return Err(BlobError::BucketAlreadyExists(request.name.clone()));
        }
        fs::create_dir_all(&dir)?;
        debug!(bucket = %request.name, path = %dir.display(), "created bucket directory");
        Ok(())
    }

    fn enable_versioning(&self, _bucket: &str) -> BlobResult<()> {
        Err(BlobError::Unsupported("versioning on a local filesystem"))
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> BlobResult<BlobObject> {
        let dir = self.existing_bucket_dir(bucket)?;
        let path = self.object_path(&dir, key)?;
        if let Some(v) = version_id.filter(|v| *v != "null") {
            return Err(BlobError::NoSuchVersion {
                bucket: bucket.to_string(),
                key: key.to_string(),
                version_id: v.to_string(),
            });
        }
        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BlobError::NoSuchKey {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let meta = fs::metadata(&path)?;
        Ok(BlobObject {
            metadata: BlobMetadata {
                last_modified: modified_at(&meta),
                content_length: content.len() as u64,
                etag: md5_hex(&content),
                version_id: None,
            },
            content: Bytes::from(content),
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: &PutMetadata,
    ) -> BlobResult<PutReceipt> {
        let dir = self.existing_bucket_dir(bucket)?;
        let path = self.object_path(&dir, key)?;
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

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        let written = fs::File::create(&partial)
            .and_then(|mut file| {
                file.write_all(&body)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&partial, &path));
        if let Err(e) = written {
            discard_partial(&partial);
            return Err(e.into());
        }

        Ok(PutReceipt {
            etag: md5_hex(&body),
            version_id: None,
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> BlobResult<()> {
        let dir = self.existing_bucket_dir(bucket)?;
        let path = self.object_path(&dir, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> BlobResult<ObjectListing> {
        if request.max_keys == 0 {
            return Err(BlobError::InvalidRequest("max_keys must be positive".into()));
        }
        let dir = self.existing_bucket_dir(&request.bucket)?;
        let mut page: Vec<ObjectSummary> = self
            .scan(&dir, &request.prefix)?
            .into_iter()
            .filter(|(key, _)| {
                request
                    .marker
                    .as_deref()
                    .map_or(true, |marker| key.as_str() > marker)
            })
            .take(request.max_keys + 1)
            .map(|(key, meta)| ObjectSummary {
                last_modified: modified_at(&meta),
                size: meta.len(),
                // Listing avoids reading file bodies; the size stands in.
                etag: format!("{:x}", meta.len()),
                key,
            })
            .collect();

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
        let dir = self.existing_bucket_dir(bucket)?;
        Ok(self
            .scan(&dir, prefix)?
            .into_iter()
            .take(max_results)
            .map(|(key, meta)| VersionSummary {
                key,
                version_id: "null".to_string(),
                last_modified: modified_at(&meta),
                is_latest: true,
                is_delete_marker: false,
            })
            .collect())
    }

    fn supports_versioning(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "front";

    fn client() -> (tempfile::TempDir, LocalBlobClient) {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalBlobClient::new(dir.path());
        client.create_bucket(&CreateBucketRequest::new(BUCKET)).unwrap();
        (dir, client)
    }

    fn put(client: &LocalBlobClient, key: &str, body: &[u8]) {
        client
            .put_object(
                BUCKET,
                key,
                Bytes::copy_from_slice(body),
                &PutMetadata::for_body(body),
            )
            .unwrap();
    }

    #[test]
    fn bucket_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalBlobClient::new(dir.path());
        assert!(matches!(
            client.head_bucket(BUCKET).unwrap_err(),
            BlobError::NoSuchBucket(_)
        ));
        client.create_bucket(&CreateBucketRequest::new(BUCKET)).unwrap();
        let info = client.head_bucket(BUCKET).unwrap();
        assert_eq!(info.name, BUCKET);
        assert!(!info.versioning_enabled);
        assert!(matches!(
            client.create_bucket(&CreateBucketRequest::new(BUCKET)).unwrap_err(),
            BlobError::BucketAlreadyExists(_)
        ));
    }

    #[test]
    fn versioning_is_unsupported() {
        let (_dir, client) = client();
        assert!(!client.supports_versioning());
        assert!(matches!(
            client.enable_versioning(BUCKET).unwrap_err(),
            BlobError::Unsupported(_)
        ));
    }

    #[test]
    fn put_get_delete() {
        let (dir, client) = client();
        put(&client, "apps/application/app1/application.json", b"{\"name\":\"app1\"}");
        assert!(dir
            .path()
            .join(BUCKET)
            .join("apps/application/app1/application.json")
            .is_file());

        let obj = client
            .get_object(BUCKET, "apps/application/app1/application.json", None)
            .unwrap();
        assert_eq!(&obj.content[..], b"{\"name\":\"app1\"}");
        assert_eq!(obj.metadata.etag, md5_hex(b"{\"name\":\"app1\"}"));

        client
            .delete_object(BUCKET, "apps/application/app1/application.json")
            .unwrap();
        client
            .delete_object(BUCKET, "apps/application/app1/application.json")
            .unwrap();
        assert!(matches!(
            client
                .get_object(BUCKET, "apps/application/app1/application.json", None)
                .unwrap_err(),
            BlobError::NoSuchKey { .. }
        ));
    }

    #[test]
    fn rejects_escaping_keys() {
        let (_dir, client) = client();
        for key in ["../outside", "/abs", "a//b", "a/./b", "", "dir/"] {
            let err = client
                .put_object(BUCKET, key, Bytes::new(), &PutMetadata::for_body(b""))
                .unwrap_err();
            assert!(matches!(err, BlobError::InvalidRequest(_)), "key {key:?}");
        }
    }

    #[test]
    fn rejects_bad_digest_without_writing() {
        let (_dir, client) = client();
        let err = client
            .put_object(
                BUCKET,
                "k.json",
                Bytes::from_static(b"new"),
                &PutMetadata::for_body(b"old"),
            )
            .unwrap_err();
        assert!(matches!(err, BlobError::BadDigest { .. }));
        assert!(client.get_object(BUCKET, "k.json", None).is_err());
    }

    #[test]
    fn failed_rename_leaves_no_partial() {
        let (dir, client) = client();
        put(&client, "a/x.json", b"{}");

        // "a" is now a directory, so renaming the upload over it fails.
        let err = client
            .put_object(BUCKET, "a", Bytes::from_static(b"{}"), &PutMetadata::for_body(b"{}"))
            .unwrap_err();
        assert!(matches!(err, BlobError::Io(_)));

        let partial = dir.path().join(BUCKET).join(format!("a{PARTIAL_SUFFIX}"));
        assert!(!partial.exists());
        assert!(client.get_object(BUCKET, "a/x.json", None).is_ok());
    }

    #[test]
    fn lists_sorted_pages() {
        let (_dir, client) = client();
        for name in ["c", "a", "b", "d"] {
            put(&client, &format!("p/{name}/x.json"), b"1");
        }
        put(&client, "q/other.json", b"1");

        let first = client
            .list_objects(&ListObjectsRequest::new(BUCKET, "p/", 3))
            .unwrap();
        let keys: Vec<_> = first.summaries.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["p/a/x.json", "p/b/x.json", "p/c/x.json"]);
        assert_eq!(first.next_marker.as_deref(), Some("p/c/x.json"));

        let mut request = ListObjectsRequest::new(BUCKET, "p/", 3);
        request.marker = first.next_marker;
        let second = client.list_objects(&request).unwrap();
        assert_eq!(second.summaries.len(), 1);
        assert_eq!(second.summaries[0].key, "p/d/x.json");
        assert!(second.next_marker.is_none());
    }

    #[test]
    fn list_versions_reports_current_only() {
        let (_dir, client) = client();
        put(&client, "k/doc.json", b"1");
        put(&client, "k/doc.json", b"2");
        let versions = client.list_versions(BUCKET, "k/doc.json", 10).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version_id, "null");
        assert!(client.get_object(BUCKET, "k/doc.json", Some("null")).is_ok());
        assert!(matches!(
            client.get_object(BUCKET, "k/doc.json", Some("v2")).unwrap_err(),
            BlobError::NoSuchVersion { .. }
        ));
    }
}
