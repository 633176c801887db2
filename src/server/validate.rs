//! Request validation.
//!
//! A request is accepted when it is a GET, its query string carries a value,
//! that value names an existing regular file, and the file has an allowed
//! extension. Only the first query value is consulted and its key is ignored,
//! so `/?f=photo.png` and `/?image=photo.png` are equivalent.

use std::path::Path;

use http::Method;

use crate::error::RequestError;

/// Extensions (lowercase, without the dot) that may be requested.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

/// Classify a request as accepted (returning the requested path) or rejected.
///
/// `root` is the directory relative paths are resolved against when probing
/// the filesystem. The returned path is the raw query value, unmodified.
pub async fn validate(
    method: &Method,
    query: Option<&str>,
    root: &Path,
) -> Result<String, RequestError> {
    if *method != Method::GET {
        return Err(RequestError::MethodNotAllowed(method.to_string()));
    }

    let path = first_query_value(query).ok_or(RequestError::MissingPath)?;

    if !has_allowed_extension(&path) {
        return Err(RequestError::UnsupportedExtension { path });
    }

    let is_file = tokio::fs::metadata(root.join(&path))
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(RequestError::FileNotFound(path));
    }

    Ok(path)
}

/// Decoded value of the first `key=value` pair, if it is non-empty.
pub fn first_query_value(query: Option<&str>) -> Option<String> {
    let (_, value) = url::form_urlencoded::parse(query?.as_bytes()).next()?;
    if value.is_empty() {
        None
    } else {
        Some(value.into_owned())
    }
}

/// Case-insensitive extension check against [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}
