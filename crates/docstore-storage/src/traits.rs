use std::collections::HashMap;

use docstore_types::{Document, ObjectType, Timestamped};

use crate::error::StorageResult;

/// Uniform CRUD, enumeration and history over every object type.
///
/// Implementations map each `(object_type, object_key)` pair to exactly one
/// stored document and keep a per-type last-modified marker that advances
/// on every store and delete.
pub trait StorageService {
    /// Create the backing bucket if it does not exist yet.
    fn ensure_bucket_exists(&self) -> StorageResult<()>;

    /// Whether the backend can keep document history at all. This is a
    /// property of the backend, not of the `versioning` setting; callers
    /// that need history must check both.
    fn supports_versioning(&self) -> bool;

    /// Fails with `StorageError::NotFound` when no document exists.
    fn load_object<T: Timestamped>(&self, object_type: ObjectType, object_key: &str)
        -> StorageResult<T>;

    /// Stamps `last_modified_by` on `item`, writes it, then advances the
    /// type's last-modified marker.
    fn store_object<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
        item: &mut T,
    ) -> StorageResult<()>;

    /// Removes the document (a missing document is not an error), then
    /// advances the type's last-modified marker.
    fn delete_object(&self, object_type: ObjectType, object_key: &str) -> StorageResult<()>;

    /// Logical key to last-modified epoch millis for every current document.
    fn list_object_keys(&self, object_type: ObjectType) -> StorageResult<HashMap<String, i64>>;

    /// Up to `max_results` revisions of a document, newest first.
    fn list_object_versions<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
        max_results: usize,
    ) -> StorageResult<Vec<T>>;

    /// Epoch millis of the type's latest recorded write; `0` if unknown.
    fn get_last_modified(&self, object_type: ObjectType) -> i64;

    fn load<D: Document>(&self, object_key: &str) -> StorageResult<D> {
        self.load_object(D::OBJECT_TYPE, object_key)
    }

    fn store<D: Document>(&self, object_key: &str, item: &mut D) -> StorageResult<()> {
        self.store_object(D::OBJECT_TYPE, object_key, item)
    }

    fn delete<D: Document>(&self, object_key: &str) -> StorageResult<()> {
        self.delete_object(D::OBJECT_TYPE, object_key)
    }

    fn list_keys<D: Document>(&self) -> StorageResult<HashMap<String, i64>> {
        self.list_object_keys(D::OBJECT_TYPE)
    }
}
