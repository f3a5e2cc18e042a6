use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Storage tier requested at bucket creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageClass {
    #[default]
    Standard,
    InfrequentAccess,
    Archive,
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::InfrequentAccess => write!(f, "IA"),
            Self::Archive => write!(f, "Archive"),
        }
    }
}

/// Canned access control list applied at bucket creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CannedAcl {
    /// Inherit the account default.
    #[default]
    Default,
    Private,
    PublicRead,
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Private => write!(f, "private"),
            Self::PublicRead => write!(f, "public-read"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub name: String,
    pub storage_class: StorageClass,
    pub acl: CannedAcl,
}

impl CreateBucketRequest {
    /// Request with the `Standard` storage class and `Default` ACL.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_class: StorageClass::default(),
            acl: CannedAcl::default(),
        }
    }
}

/// Bucket metadata returned by `head_bucket`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub storage_class: StorageClass,
    pub versioning_enabled: bool,
    pub created: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Metadata supplied with an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutMetadata {
    pub content_length: u64,
    /// Base64-encoded MD5 of the body.
    pub content_md5: String,
}

impl PutMetadata {
    /// Metadata for `body`, with its length and MD5 computed here.
    pub fn for_body(body: &[u8]) -> Self {
        Self {
            content_length: body.len() as u64,
            content_md5: crate::checksum::content_md5(body),
        }
    }
}

/// Acknowledgement of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutReceipt {
    /// Hex MD5 of the stored body.
    pub etag: String,
    /// Version id assigned by a versioned bucket.
    pub version_id: Option<String>,
}

/// Metadata returned alongside object content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobMetadata {
    pub last_modified: DateTime<Utc>,
    pub content_length: u64,
    pub etag: String,
    pub version_id: Option<String>,
}

/// Object content plus its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobObject {
    pub content: Bytes,
    pub metadata: BlobMetadata,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One page request for `list_objects`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: String,
    /// Continuation marker from the previous page; `None` for the first page.
    pub marker: Option<String>,
    pub max_keys: usize,
}

impl ListObjectsRequest {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>, max_keys: usize) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            marker: None,
            max_keys,
        }
    }
}

/// A current object as reported by `list_objects`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    pub etag: String,
}

/// One page of `list_objects` results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub summaries: Vec<ObjectSummary>,
    /// Marker for the next page. `None` (or an empty string, which some
    /// services send) means the listing is complete.
    pub next_marker: Option<String>,
}

/// One historical revision reported by `list_versions`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionSummary {
    pub key: String,
    pub version_id: String,
    pub last_modified: DateTime<Utc>,
    pub is_latest: bool,
    pub is_delete_marker: bool,
}
