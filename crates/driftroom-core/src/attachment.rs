//! Image attachment validation and encoding.
//!
//! Turns raw image bytes into a self-contained `data:` URI that can be sent
//! over the live transport and rendered directly, without a further fetch.
//! Validation failures are reported synchronously to the caller so a rejected
//! send is never silently dropped. Reading the file is the driver's job; this
//! module is pure.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Maximum accepted image size in bytes (5 MiB).
///
/// Files exactly at the boundary are accepted.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Attachment validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// File exceeds the size limit.
    #[error("image is {size} bytes, above the {limit}-byte limit")]
    TooLarge {
        /// Size of the rejected file in bytes.
        size: usize,
        /// The enforced limit in bytes.
        limit: usize,
    },

    /// File is not an image.
    #[error("unsupported attachment type {mime:?}: only image/* is accepted")]
    UnsupportedType {
        /// MIME type of the rejected file.
        mime: String,
    },
}

/// Validate and encode an image file as a base64 data URI.
///
/// The MIME type must begin with `image/` and the payload must be at most
/// [`MAX_IMAGE_BYTES`]. A `text/plain` file is rejected with a type error
/// regardless of its size.
pub fn encode(mime: &str, bytes: &[u8]) -> Result<String, AttachmentError> {
    if !mime.starts_with("image/") {
        return Err(AttachmentError::UnsupportedType { mime: mime.to_owned() });
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AttachmentError::TooLarge { size: bytes.len(), limit: MAX_IMAGE_BYTES });
    }

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
