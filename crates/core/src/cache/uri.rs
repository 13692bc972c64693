//! Resource URIs for cached documents.
//!
//! A document's URI is `jinamd://<cache key>`. The key is embedded verbatim,
//! so the mapping is reversible and distinct keys never collide.

use crate::Error;

use super::hash::is_cache_key;

/// URI scheme for cached Markdown resources.
pub const URI_SCHEME: &str = "jinamd";

/// Build the resource URI for a cache key.
pub fn resource_uri(key: &str) -> String {
    format!("{URI_SCHEME}://{key}")
}

/// Recover the cache key from a resource URI.
///
/// # Errors
///
/// - `InvalidInput` if the URI does not use the `jinamd` scheme.
/// - `NotFound` if the remainder cannot be a cache key, since no document
///   could ever be stored under it.
pub fn key_from_uri(uri: &str) -> Result<&str, Error> {
    let uri = uri.trim();
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(Error::InvalidInput(format!("not a resource URI: {uri}")));
    };

    if !scheme.eq_ignore_ascii_case(URI_SCHEME) {
        return Err(Error::InvalidInput(format!("unsupported URI scheme: {scheme}")));
    }

    let key = rest.trim_end_matches('/');
    if !is_cache_key(key) {
        return Err(Error::NotFound(format!("resource not found: {uri}")));
    }

    Ok(key)
}
