//! Homepage validation for project URLs

use url::Url;

/// Keep a homepage only when it is a well-formed absolute URL.
///
/// The trimmed text is returned as written so that the manifest does not
/// churn on URL normalization (a trailing slash, a lowercased host).
pub fn ensure_valid_url(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) if !url.cannot_be_a_base() && url.host_str().is_some() => Some(trimmed.to_string()),
        _ => None,
    }
}
