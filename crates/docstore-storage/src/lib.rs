//! Versioned JSON document storage over a flat blob bucket.
//!
//! Documents are grouped by [`ObjectType`](docstore_types::ObjectType). Each
//! type owns a folder under the configured root, each document a sub-folder
//! holding one metadata file, and each type one `last-modified.json` marker:
//!
//! ```text
//! <root>/<group>/<lowercase-object-key>/<metadata-filename>
//! <root>/<group>/last-modified.json
//! ```
//!
//! # Components
//!
//! - [`KeyBuilder`] -- backend keys from `(group, object key)` and back
//! - [`codec`] -- JSON encoding plus the upload `Content-MD5`
//! - [`ListingEngine`] -- paginated enumeration of a type's current documents
//! - [`VersionReader`] -- the current document or its revision history
//! - [`LastModifiedTracker`] -- the per-type marker read without listing
//! - [`BlobStorageService`] -- the [`StorageService`] facade composing them
//!
//! # Consistency
//!
//! A store or delete is two backend calls: the document write, then the
//! marker write. They are not atomic. A failure between them leaves the
//! marker older than the last real write; the marker is advisory and may lag.

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod last_modified;
pub mod listing;
pub mod service;
pub mod traits;
pub mod versions;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StorageConfig, DEFAULT_PAGE_SIZE};
pub use error::{StorageError, StorageResult};
pub use identity::{AnonymousIdentity, IdentityProvider, StaticIdentity, ANONYMOUS};
pub use keys::{KeyBuilder, LAST_MODIFIED_FILENAME};
pub use last_modified::{LastModifiedMarker, LastModifiedTracker};
pub use listing::ListingEngine;
pub use service::BlobStorageService;
pub use traits::StorageService;
pub use versions::VersionReader;
