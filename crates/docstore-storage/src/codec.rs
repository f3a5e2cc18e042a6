//! JSON encoding for stored documents.

use bytes::Bytes;
use docstore_blob::PutMetadata;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// An encoded document ready for upload: body plus the length and
/// `Content-MD5` the backend verifies it against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: Bytes,
    pub metadata: PutMetadata,
}

/// Encode a value as JSON and compute its upload metadata.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> StorageResult<EncodedBody> {
    let bytes = serde_json::to_vec(value).map_err(StorageError::Serialization)?;
    let metadata = PutMetadata::for_body(&bytes);
    Ok(EncodedBody {
        body: Bytes::from(bytes),
        metadata,
    })
}

/// Decode the blob stored at `key`.
pub fn deserialize<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StorageError::Deserialization {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_blob::content_md5;
    use docstore_types::GenericDocument;
    use serde::ser::Error as _;
    use serde_json::json;

    #[test]
    fn serialize_attaches_checksum() {
        let encoded = serialize(&json!({"name": "app1"})).unwrap();
        assert_eq!(&encoded.body[..], br#"{"name":"app1"}"#);
        assert_eq!(encoded.metadata.content_length, encoded.body.len() as u64);
        assert_eq!(encoded.metadata.content_md5, content_md5(&encoded.body));
    }

    #[test]
    fn serialize_failure_is_reported() {
        struct Unencodable;
        impl Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("cannot encode"))
            }
        }
        let err = serialize(&Unencodable).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn deserialize_names_the_key() {
        let err = deserialize::<GenericDocument>("apps/x/x.json", b"{not json").unwrap_err();
        match err {
            StorageError::Deserialization { key, .. } => assert_eq!(key, "apps/x/x.json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn deserialize_document() {
        let doc: GenericDocument =
            deserialize("k", br#"{"name":"app1","lastModifiedBy":"bob"}"#).unwrap();
        assert_eq!(doc.get("name"), Some(&json!("app1")));
        assert_eq!(doc.last_modified_by.as_deref(), Some("bob"));
    }
}
