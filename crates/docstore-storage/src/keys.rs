//! Backend key layout.
//!
//! Every document of a type lives under one folder, one sub-folder per object
//! key, holding the type's metadata file:
//!
//! ```text
//! <root>/<group>/<lowercase-object-key>/<metadata-filename>
//! <root>/<group>/last-modified.json
//! ```

/// File name of the per-group last-modified marker.
pub const LAST_MODIFIED_FILENAME: &str = "last-modified.json";

/// Collapse every run of `/` to a single separator.
fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(ch);
    }
    out
}

/// `root/group`, with doubled separators collapsed.
///
/// A separator left at the front by an empty root folder is dropped, so an
/// unrooted layout starts directly at the group (`application/...`). Older
/// layouts that kept the leading `/` (`/application/...`) are not found under
/// these keys and need migrating.
pub fn typed_folder(root_folder: &str, group: &str) -> String {
    let joined = collapse_separators(&format!("{root_folder}/{group}"));
    joined.trim_start_matches('/').to_string()
}

/// Derives backend keys for one root folder.
///
/// Keys never start with `/`, even when the root folder is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBuilder {
    root_folder: String,
}

impl KeyBuilder {
    pub fn new(root_folder: impl Into<String>) -> Self {
        Self {
            root_folder: root_folder.into(),
        }
    }

    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    /// Folder holding every document of `group`.
    pub fn typed_folder(&self, group: &str) -> String {
        typed_folder(&self.root_folder, group)
    }

    /// `typed_folder` plus a trailing separator: the listing prefix for a
    /// group. The separator keeps `pipeline` from matching `pipeline-strategy`.
    pub fn listing_prefix(&self, group: &str) -> String {
        format!("{}/", self.typed_folder(group))
    }

    /// Full key of the document `object_key` in `group`.
    ///
    /// An `object_key` that already ends with `metadata_filename` is taken to
    /// be a resolved backend key and is returned unchanged. Otherwise the key
    /// is lower-cased, so callers must not rely on case being preserved.
    pub fn backend_key(&self, group: &str, object_key: &str, metadata_filename: &str) -> String {
        if object_key.ends_with(metadata_filename) {
            return object_key.to_string();
        }
        collapse_separators(&format!(
            "{}/{}/{}",
            self.typed_folder(group),
            object_key.to_lowercase(),
            metadata_filename
        ))
    }

    /// Key of `group`'s last-modified marker.
    pub fn last_modified_key(&self, group: &str) -> String {
        format!("{}/{}", self.typed_folder(group), LAST_MODIFIED_FILENAME)
    }

    /// Recover the logical object key from a full backend key.
    ///
    /// Strips the `root/group/` prefix and the `/metadata_filename` suffix.
    /// Input of any other shape is passed through with whatever parts did
    /// match removed; no error is raised.
    pub fn object_key(&self, backend_key: &str, group: &str, metadata_filename: &str) -> String {
        let prefix = self.listing_prefix(group);
        let suffix = format!("/{metadata_filename}");
        let without_prefix = backend_key.strip_prefix(&prefix).unwrap_or(backend_key);
        without_prefix
            .strip_suffix(&suffix)
            .unwrap_or(without_prefix)
            .to_string()
    }
}
