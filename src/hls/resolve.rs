//! Relative reference resolution for playlist URIs.

use url::Url;

/// Directory of a playlist URL: scheme, authority and path up to the last `/`.
///
/// Query and fragment are dropped. Fails for URLs that cannot act as a base
/// (`data:`, `mailto:` and the like).
pub fn directory_of(playlist_url: &Url) -> Result<Url, url::ParseError> {
    if playlist_url.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    playlist_url.join("./")
}

/// Absolute URL that `reference` points to when found in a playlist at `base`.
///
/// References that already carry a scheme are returned unchanged; everything
/// else goes through RFC 3986 resolution against `base`.
pub fn resolve(base: &Url, reference: &str) -> Result<String, url::ParseError> {
    if has_scheme(reference) {
        return Ok(reference.to_string());
    }
    base.join(reference).map(String::from)
}

/// `true` when `reference` starts with `scheme ":"` per RFC 3986 §3.1.
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
