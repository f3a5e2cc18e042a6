use bytes::Bytes;

use crate::error::BlobResult;
use crate::model::{
    BlobObject, BucketInfo, CreateBucketRequest, ListObjectsRequest, ObjectListing, PutMetadata,
    PutReceipt, VersionSummary,
};

/// Key/blob store with optional object versioning.
///
/// All implementations must satisfy these invariants:
/// - `put_object` rejects a body whose MD5 or length does not match the
///   supplied [`PutMetadata`], and commits nothing in that case.
/// - `get_object` without a version id returns the current object; a key
///   whose latest revision is a delete marker is reported as missing.
/// - `delete_object` succeeds whether or not the key exists.
/// - `list_objects` pages through current objects in lexicographic key order.
/// - Every call is one blocking round trip; nothing is retried.
pub trait BlobClient: Send + Sync {
    /// Bucket metadata, or `BlobError::NoSuchBucket`.
    fn head_bucket(&self, bucket: &str) -> BlobResult<BucketInfo>;

    fn create_bucket(&self, request: &CreateBucketRequest) -> BlobResult<()>;

    /// Turn on version retention for an existing bucket.
    fn enable_versioning(&self, bucket: &str) -> BlobResult<()>;

    /// Fetch an object, or one specific revision of it.
    ///
    /// Returns `BlobError::NoSuchKey` / `BlobError::NoSuchVersion` when absent.
    fn get_object(&self, bucket: &str, key: &str, version_id: Option<&str>)
        -> BlobResult<BlobObject>;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: &PutMetadata,
    ) -> BlobResult<PutReceipt>;

    fn delete_object(&self, bucket: &str, key: &str) -> BlobResult<()>;

    /// One page of current objects under `request.prefix`.
    fn list_objects(&self, request: &ListObjectsRequest) -> BlobResult<ObjectListing>;

    /// Up to `max_results` revisions of keys under `prefix`, newest first per
    /// key.
    fn list_versions(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: usize,
    ) -> BlobResult<Vec<VersionSummary>>;

    /// Whether this backend can retain historical revisions at all.
    ///
    /// A static property of the implementation, unrelated to whether
    /// versioning has been enabled on any particular bucket.
    fn supports_versioning(&self) -> bool;

    /// Check whether a bucket exists, mapping `NoSuchBucket` to `false`.
    fn bucket_exists(&self, bucket: &str) -> BlobResult<bool> {
        match self.head_bucket(bucket) {
            Ok(_) => Ok(true),
            Err(crate::BlobError::NoSuchBucket(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<C: BlobClient + ?Sized> BlobClient for std::sync::Arc<C> {
    fn head_bucket(&self, bucket: &str) -> BlobResult<BucketInfo> {
        (**self).head_bucket(bucket)
    }

    fn create_bucket(&self, request: &CreateBucketRequest) -> BlobResult<()> {
        (**self).create_bucket(request)
    }

    fn enable_versioning(&self, bucket: &str) -> BlobResult<()> {
        (**self).enable_versioning(bucket)
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> BlobResult<BlobObject> {
        (**self).get_object(bucket, key, version_id)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        metadata: &PutMetadata,
    ) -> BlobResult<PutReceipt> {
        (**self).put_object(bucket, key, body, metadata)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> BlobResult<()> {
        (**self).delete_object(bucket, key)
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> BlobResult<ObjectListing> {
        (**self).list_objects(request)
    }

    fn list_versions(
        &self,
        bucket: &str,
        prefix: &str,
        max_results: usize,
    ) -> BlobResult<Vec<VersionSummary>> {
        (**self).list_versions(bucket, prefix, max_results)
    }

    fn supports_versioning(&self) -> bool {
        (**self).supports_versioning()
    }
}
