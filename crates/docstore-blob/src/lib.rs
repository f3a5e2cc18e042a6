//! Blob client interface for docstore.
//!
//! docstore never talks to a storage vendor directly. It consumes the
//! [`BlobClient`] trait: a small, capability-based set of bucket and object
//! operations (head/create bucket, get/put/delete object, paginated listing,
//! version listing) modelled on what S3-style object stores offer.
//!
//! # Backends
//!
//! - [`InMemoryBlobClient`] -- versioning-capable in-memory buckets, with call
//!   counters and failure injection for tests
//! - [`LocalBlobClient`] -- buckets as directories on the local filesystem
//!
//! # Rules every backend follows
//!
//! 1. `put_object` verifies the supplied content MD5 and rejects mismatches
//!    with [`BlobError::BadDigest`] before committing any bytes.
//! 2. `delete_object` is idempotent: deleting a missing key succeeds.
//! 3. `list_objects` returns keys in lexicographic order and hands back a
//!    continuation marker only while more keys remain.
//! 4. Missing buckets, keys and versions surface as distinct error variants.

pub mod checksum;
pub mod error;
pub mod local;
pub mod memory;
pub mod model;
pub mod traits;

pub use checksum::{content_md5, md5_hex};
pub use error::{BlobError, BlobResult};
pub use local::LocalBlobClient;
pub use memory::{InMemoryBlobClient, Operation};
pub use model::{
    BlobMetadata, BlobObject, BucketInfo, CannedAcl, CreateBucketRequest, ListObjectsRequest,
    ObjectListing, ObjectSummary, PutMetadata, PutReceipt, StorageClass, VersionSummary,
};
pub use traits::BlobClient;
