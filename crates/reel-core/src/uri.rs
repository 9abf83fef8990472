//! URI resolution against playlist locations

use url::Url;

use crate::error::{Error, Result};

/// Resolves `reference` against `base`, per RFC 3986
///
/// Absolute references pass through unchanged; an empty reference
/// yields the base itself.
pub fn resolve(base: &Url, reference: &str) -> Result<Url> {
    if reference.is_empty() {
        return Ok(base.clone());
    }
    base.join(reference).map_err(|e| Error::InvalidReference {
        reference: reference.to_string(),
        source: e,
    })
}

/// Resolves an optional reference, treating absent and empty alike
pub(crate) fn resolve_optional(base: &Url, reference: Option<&str>) -> Result<Option<Url>> {
    match reference {
        Some(r) if !r.is_empty() => resolve(base, r).map(Some),
        _ => Ok(None),
    }
}

/// Returns the directory of `uri`, with a trailing slash
pub fn base_of(uri: &Url) -> Url {
    uri.join(".").unwrap_or_else(|_| uri.clone())
}

/// Returns the last path component of `uri`
pub fn file_name(uri: &Url) -> &str {
    let path = uri.path();
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}
