//! URL validation and canonicalization.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("missing scheme or host")]
    MissingParts,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for cuppy_core::Error {
    fn from(err: UrlError) -> Self {
        cuppy_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a URL string for consistent cache keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an explicit http/https scheme and a host
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {
            let h = host.to_lowercase();
            parsed
                .set_host(Some(h.as_str()))
                .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        }
        _ => return Err(UrlError::MissingParts),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// The presumed location of the policy document for a URL's origin:
/// `scheme://host[:port]/robots.txt`. Path and query are discarded.
pub fn robots_location(url: &Url) -> String {
    format!("{}/robots.txt", url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_rejects_missing_scheme() {
        assert!(matches!(canonicalize("example.com/page"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_rejects_plain_words() {
        assert!(canonicalize("not a url").is_err());
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/Path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com/page#section").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com/page?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize("  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_robots_location_discards_path_and_query() {
        let url = canonicalize("https://example.com/a/b?q=1").unwrap();
        assert_eq!(robots_location(&url), "https://example.com/robots.txt");
    }

    #[test]
    fn test_robots_location_keeps_explicit_port() {
        let url = canonicalize("http://example.com:8080/a").unwrap();
        assert_eq!(robots_location(&url), "http://example.com:8080/robots.txt");
    }
}
