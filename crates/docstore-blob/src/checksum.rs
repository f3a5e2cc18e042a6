//! Content digests attached to uploads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

/// Base64-encoded MD5 of `data`, the form carried in a `Content-MD5` header.
pub fn content_md5(data: &[u8]) -> String {
    STANDARD.encode(Md5::digest(data))
}

/// Hex-encoded MD5 of `data`, the form used for ETags.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Check `data` against a base64 `Content-MD5` value.
///
/// Returns the computed digest on mismatch.
pub fn verify_content_md5(data: &[u8], expected: &str) -> Result<(), String> {
    let computed = content_md5(data);
    if computed == expected {
        Ok(())
    } else {
        Err(computed)
    }
}
