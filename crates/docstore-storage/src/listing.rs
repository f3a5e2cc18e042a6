use std::collections::HashMap;
use std::time::Instant;

use docstore_blob::{BlobClient, ListObjectsRequest, ObjectSummary};
use docstore_types::ObjectType;
use tracing::debug;

use crate::error::StorageResult;
use crate::keys::KeyBuilder;

/// Enumerates the current documents of an object type.
pub struct ListingEngine<'a, C: ?Sized> {
    client: &'a C,
    bucket: &'a str,
    keys: &'a KeyBuilder,
    page_size: usize,
}

impl<'a, C: BlobClient + ?Sized> ListingEngine<'a, C> {
    pub fn new(client: &'a C, bucket: &'a str, keys: &'a KeyBuilder, page_size: usize) -> Self {
        Self {
            client,
            bucket,
            keys,
            page_size,
        }
    }

    /// Map of logical object key to last-modified epoch millis for every
    /// current document of `object_type`.
    ///
    /// Blobs in the type's folder that are not metadata files (the
    /// last-modified marker, stray artifacts) are left out.
    pub fn list_keys(&self, object_type: ObjectType) -> StorageResult<HashMap<String, i64>> {
        let started = Instant::now();
        let prefix = self.keys.listing_prefix(object_type.group());
        let (summaries, pages) = self.fetch_all(&prefix)?;

        debug!(
            fetch_time_ms = started.elapsed().as_millis() as u64,
            entries = summaries.len(),
            pages,
            object_type = %object_type,
            "fetched object keys"
        );

        let filename = object_type.default_metadata_filename();
        Ok(summaries
            .into_iter()
            .filter(|s| s.key.ends_with(filename))
            .map(|s| {
                (
                    self.keys.object_key(&s.key, object_type.group(), filename),
                    s.last_modified.timestamp_millis(),
                )
            })
            .collect())
    }

    /// Every summary under `prefix`, following continuation markers page by
    /// page. Returns the summaries and the number of pages requested.
    fn fetch_all(&self, prefix: &str) -> StorageResult<(Vec<ObjectSummary>, usize)> {
        let mut request = ListObjectsRequest::new(self.bucket, prefix, self.page_size);
        let mut summaries = Vec::new();
        let mut pages = 0;

        loop {
            let listing = self.client.list_objects(&request)?;
            pages += 1;
            summaries.extend(listing.summaries);

            match listing.next_marker.filter(|m| !m.is_empty()) {
                Some(marker) => request.marker = Some(marker),
                None => break,
            }
        }
        Ok((summaries, pages))
    }
}
