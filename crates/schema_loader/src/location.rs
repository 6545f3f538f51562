//! Normalisation of caller-supplied resource locations into URLs.

use crate::{LoadError, Result};
use std::path::Path;
use url::Url;

/// Turns a location into an absolute URL.
///
/// Absolute URLs (anything with a scheme, such as `https://` or `urn:`) are
/// kept as they are. Everything else is treated as a filesystem path,
/// resolved against the current directory and converted to a `file://` URL.
pub fn to_url(location: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(location) {
        // Single-letter schemes are Windows drive letters, not URLs.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let (path_part, fragment) = match location.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (location, None),
    };

    let path = Path::new(path_part);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut url = Url::from_file_path(&absolute)
        .map_err(|_| LoadError::invalid_location(location, "not a valid file path"))?;
    url.set_fragment(fragment);
    Ok(url)
}

/// Returns the URL without its fragment.
pub fn strip_fragment(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_fragment(None);
    base
}
