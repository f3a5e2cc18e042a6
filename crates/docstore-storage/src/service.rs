use std::collections::HashMap;

use docstore_blob::{BlobClient, BlobError, CannedAcl, CreateBucketRequest, StorageClass};
use docstore_types::{ObjectType, Timestamped};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::identity::{AnonymousIdentity, IdentityProvider};
use crate::keys::KeyBuilder;
use crate::last_modified::LastModifiedTracker;
use crate::listing::ListingEngine;
use crate::traits::StorageService;
use crate::versions::VersionReader;

/// [`StorageService`] over any [`BlobClient`].
///
/// Owns one long-lived client for its whole lifetime. Every operation is a
/// short sequence of blocking calls on that client; nothing is cached, so
/// every read sees the backend's current state.
pub struct BlobStorageService<C> {
    client: C,
    config: StorageConfig,
    keys: KeyBuilder,
    identity: Box<dyn IdentityProvider>,
    clock: Box<dyn Clock>,
}

impl<C: BlobClient> BlobStorageService<C> {
    /// Validates `config`. Writes are attributed to `anonymous` until an
    /// identity provider is set with [`with_identity`](Self::with_identity).
    pub fn new(client: C, config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self {
            keys: KeyBuilder::new(config.root_folder.clone()),
            client,
            config,
            identity: Box::new(AnonymousIdentity),
            clock: Box::new(SystemClock),
        })
    }

    pub fn with_identity(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    /// Backend key of a document.
    pub fn backend_key(&self, object_type: ObjectType, object_key: &str) -> String {
        self.keys.backend_key(
            object_type.group(),
            object_key,
            object_type.default_metadata_filename(),
        )
    }

    fn bucket(&self) -> &str {
        &self.config.bucket_name
    }

    fn tracker(&self) -> LastModifiedTracker<'_, C> {
        LastModifiedTracker::new(&self.client, self.bucket(), &self.keys, self.clock.as_ref())
    }

    fn reader(&self) -> VersionReader<'_, C> {
        VersionReader::new(&self.client, self.bucket(), &self.keys, self.config.versioning)
    }
}

impl<C: BlobClient> StorageService for BlobStorageService<C> {
    fn ensure_bucket_exists(&self) -> StorageResult<()> {
        let bucket = self.bucket();
        match self.client.head_bucket(bucket) {
            Ok(_) => Ok(()),
            Err(BlobError::NoSuchBucket(_)) => {
                self.client.create_bucket(&CreateBucketRequest {
                    name: bucket.to_string(),
                    storage_class: StorageClass::Standard,
                    acl: CannedAcl::Default,
                })?;
                info!(bucket, "created bucket");

                if self.config.versioning {
                    if self.client.supports_versioning() {
                        self.client.enable_versioning(bucket)?;
                        info!(bucket, "enabled bucket versioning");
                    } else {
                        warn!(bucket, "versioning requested but the backend cannot keep versions");
                    }
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn supports_versioning(&self) -> bool {
        self.client.supports_versioning()
    }

    fn load_object<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
    ) -> StorageResult<T> {
        self.reader().load_current(object_type, object_key)
    }

    fn store_object<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
        item: &mut T,
    ) -> StorageResult<()> {
        item.set_last_modified_by(self.identity.principal_or_anonymous());
        let encoded = codec::serialize(&*item)?;
        let key = self.backend_key(object_type, object_key);

        self.client
            .put_object(self.bucket(), &key, encoded.body, &encoded.metadata)?;
        self.tracker().write_last_modified(object_type.group())?;
        Ok(())
    }

    fn delete_object(&self, object_type: ObjectType, object_key: &str) -> StorageResult<()> {
        let key = self.backend_key(object_type, object_key);
        self.client.delete_object(self.bucket(), &key)?;
        self.tracker().write_last_modified(object_type.group())?;
        Ok(())
    }

    fn list_object_keys(&self, object_type: ObjectType) -> StorageResult<HashMap<String, i64>> {
        ListingEngine::new(
            &self.client,
            self.bucket(),
            &self.keys,
            self.config.page_size(),
        )
        .list_keys(object_type)
    }

    fn list_object_versions<T: Timestamped>(
        &self,
        object_type: ObjectType,
        object_key: &str,
        max_results: usize,
    ) -> StorageResult<Vec<T>> {
        self.reader()
            .load_versions(object_type, object_key, max_results)
    }

    fn get_last_modified(&self, object_type: ObjectType) -> i64 {
        self.tracker().get_last_modified(object_type)
    }
}

impl<C> std::fmt::Debug for BlobStorageService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStorageService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StorageError;
    use crate::identity::StaticIdentity;
    use docstore_blob::{InMemoryBlobClient, LocalBlobClient, Operation};
    use docstore_types::{Application, GenericDocument};
    use serde_json::json;

    const BUCKET: &str = "front";

    fn service(client: InMemoryBlobClient) -> BlobStorageService<InMemoryBlobClient> {
        BlobStorageService::new(client, StorageConfig::new(BUCKET).with_root_folder("apps"))
            .unwrap()
            .with_identity(StaticIdentity::new("alice"))
            .with_clock(ManualClock::new(1_000))
    }

    // -----------------------------------------------------------------------
    // Bucket provisioning
    // -----------------------------------------------------------------------

    #[test]
    fn creates_missing_bucket_with_versioning() {
        let svc = service(InMemoryBlobClient::new());
        svc.ensure_bucket_exists().unwrap();
        let info = svc.client().head_bucket(BUCKET).unwrap();
        assert!(info.versioning_enabled);
        assert_eq!(info.storage_class, StorageClass::Standard);
    }

    #[test]
    fn creates_bucket_without_versioning_when_disabled() {
        let svc = BlobStorageService::new(
            InMemoryBlobClient::new(),
            StorageConfig::new(BUCKET).with_versioning(false),
        )
        .unwrap();
        svc.ensure_bucket_exists().unwrap();
        assert!(!svc.client().head_bucket(BUCKET).unwrap().versioning_enabled);
        assert_eq!(svc.client().calls(Operation::EnableVersioning), 0);
    }

    #[test]
    fn existing_bucket_is_left_alone() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false));
        svc.ensure_bucket_exists().unwrap();
        assert_eq!(svc.client().calls(Operation::CreateBucket), 0);
        assert_eq!(svc.client().calls(Operation::EnableVersioning), 0);
    }

    #[test]
    fn other_head_failures_are_returned() {
        let client = InMemoryBlobClient::new();
        client.fail(Operation::HeadBucket);
        let svc = service(client);
        let err = svc.ensure_bucket_exists().unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BlobError::Service { .. })
        ));
        assert_eq!(svc.client().calls(Operation::CreateBucket), 0);
    }

    #[test]
    fn local_backend_skips_versioning() {
        let dir = tempfile::tempdir().unwrap();
        let svc =
            BlobStorageService::new(LocalBlobClient::new(dir.path()), StorageConfig::new(BUCKET))
                .unwrap();
        svc.ensure_bucket_exists().unwrap();
        assert!(dir.path().join(BUCKET).is_dir());
        assert!(!svc.supports_versioning());
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn store_then_load() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, true));
        let mut doc = GenericDocument::default().with("name", "app1");
        svc.store_object(ObjectType::Application, "App1", &mut doc).unwrap();
        assert_eq!(doc.last_modified_by.as_deref(), Some("alice"));
        assert_eq!(
            svc.client().keys(BUCKET),
            vec![
                "apps/application/app1/application.json",
                "apps/application/last-modified.json"
            ]
        );

        let loaded: GenericDocument = svc.load_object(ObjectType::Application, "App1").unwrap();
        assert_eq!(loaded.get("name"), Some(&json!("app1")));
        assert_eq!(loaded.last_modified_by.as_deref(), Some("alice"));
        assert!(loaded.last_modified.is_some());
    }

    #[test]
    fn anonymous_writer_by_default() {
        let svc = BlobStorageService::new(
            InMemoryBlobClient::with_bucket(BUCKET, false),
            StorageConfig::new(BUCKET),
        )
        .unwrap();
        let mut app = Application::new("app1");
        svc.store("app1", &mut app).unwrap();
        assert_eq!(app.last_modified_by.as_deref(), Some("anonymous"));
    }

    #[test]
    fn typed_helpers_use_document_type() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false));
        let mut app = Application::new("billing");
        svc.store("Billing", &mut app).unwrap();
        let loaded: Application = svc.load("billing").unwrap();
        assert_eq!(loaded.name, "billing");
        assert!(svc.list_keys::<Application>().unwrap().contains_key("billing"));
        svc.delete::<Application>("billing").unwrap();
        assert!(svc.load::<Application>("billing").unwrap_err().is_not_found());
    }

    #[test]
    fn load_missing_is_not_found() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false));
        let err = svc
            .load_object::<GenericDocument>(ObjectType::Project, "nope")
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::NotFound { object_type: ObjectType::Project, ref key } if key == "nope"
        ));
    }

    #[test]
    fn failed_upload_leaves_marker_untouched() {
        let client = InMemoryBlobClient::with_bucket(BUCKET, false);
        client.fail(Operation::PutObject);
        let svc = service(client);
        let mut doc = GenericDocument::default().with("name", "x");
        assert!(svc.store_object(ObjectType::Project, "x", &mut doc).is_err());
        assert_eq!(svc.client().calls(Operation::PutObject), 1);
        assert_eq!(svc.get_last_modified(ObjectType::Project), 0);
    }

    #[test]
    fn store_reports_marker_failure_after_writing_document() {
        let client = InMemoryBlobClient::with_bucket(BUCKET, false);
        client.fail_key("apps/application/last-modified.json");
        let svc = service(client);
        let mut doc = GenericDocument::default().with("name", "a");

        let err = svc
            .store_object(ObjectType::Application, "a", &mut doc)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::MarkerWrite { ref key, .. }
                if key == "apps/application/last-modified.json"
        ));
        // The document write is not rolled back; only the marker lags.
        assert!(svc
            .load_object::<GenericDocument>(ObjectType::Application, "a")
            .is_ok());
        assert_eq!(svc.get_last_modified(ObjectType::Application), 0);
    }

    #[test]
    fn delete_reports_marker_failure_after_deleting_document() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false));
        let mut doc = GenericDocument::default().with("name", "p");
        svc.store_object(ObjectType::Pipeline, "p", &mut doc).unwrap();
        svc.client().fail_key("apps/pipeline/last-modified.json");

        let err = svc.delete_object(ObjectType::Pipeline, "p").unwrap_err();
        assert!(matches!(err, StorageError::MarkerWrite { .. }));
        assert!(svc
            .load_object::<GenericDocument>(ObjectType::Pipeline, "p")
            .unwrap_err()
            .is_not_found());
        assert_eq!(svc.get_last_modified(ObjectType::Pipeline), 1_000);
    }

    #[test]
    fn delete_missing_still_rewrites_marker() {
        let clock = ManualClock::new(42);
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false)).with_clock(clock);
        svc.delete_object(ObjectType::Pipeline, "never-stored").unwrap();
        assert_eq!(svc.get_last_modified(ObjectType::Pipeline), 42);
    }

    #[test]
    fn marker_tracks_latest_write() {
        let svc = service(InMemoryBlobClient::with_bucket(BUCKET, false));
        assert_eq!(svc.get_last_modified(ObjectType::Application), 0);
        let mut doc = GenericDocument::default().with("name", "a");
        svc.store_object(ObjectType::Application, "a", &mut doc).unwrap();
        assert_eq!(svc.get_last_modified(ObjectType::Application), 1_000);
    }

    #[test]
    fn debug_hides_client() {
        let svc = service(InMemoryBlobClient::new());
        let debug = format!("{svc:?}");
        assert!(debug.contains("BlobStorageService"));
        assert!(debug.contains("front"));
    }
}
