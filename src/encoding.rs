//! Image file to data URL conversion.
//!
//! History records store the analyzed image as a self-contained
//! `data:<mime>;base64,<payload>` URL, never as a path.

use base64::Engine as _;
use std::path::Path;
use thiserror::Error;

/// Errors raised while encoding an image.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image type: {0} (expected png, jpeg or webp)")]
    UnsupportedType(String),

    #[error("Image is empty: {0}")]
    Empty(String),

    #[error("Image is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Malformed data URL")]
    MalformedDataUrl,
}

/// Guess the MIME type of an image from its extension.
pub fn detect_mime(path: &Path) -> Result<&'static str, EncodingError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        _ => Err(EncodingError::UnsupportedType(path.display().to_string())),
    }
}

/// Read an image and encode it as a data URL.
pub fn file_to_data_url(path: &Path, max_bytes: u64) -> Result<String, EncodingError> {
    let mime = detect_mime(path)?;
    let read_err = |source| EncodingError::Read {
        path: path.display().to_string(),
        source,
    };

    let size = std::fs::metadata(path).map_err(read_err)?.len();
    if size == 0 {
        return Err(EncodingError::Empty(path.display().to_string()));
    }
    if size > max_bytes {
        return Err(EncodingError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let bytes = std::fs::read(path).map_err(read_err)?;
    Ok(to_data_url(mime, &bytes))
}

/// Encode raw bytes as a data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a base64 data URL into `(mime, payload)`.
pub fn split_data_url(url: &str) -> Result<(&str, &str), EncodingError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(EncodingError::MalformedDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(EncodingError::MalformedDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(EncodingError::MalformedDataUrl)?;

    if mime.is_empty() || payload.is_empty() {
        return Err(EncodingError::MalformedDataUrl);
    }
    Ok((mime, payload))
}
