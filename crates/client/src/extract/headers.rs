//! Canonical URL from the HTTP `Link` header.

/// Scan one `Link` header value for an entry with `rel="canonical"`.
///
/// A header can carry several comma-separated link-values; each is scanned
/// independently and the first canonical target wins. The `rel` parameter
/// may be quoted or bare, and may list several relation types.
pub fn canonical_from_link_header(value: &str) -> Option<String> {
    for link in value.split(',') {
        let mut parts = link.split(';');
        let target = parts.next().unwrap_or("").trim();
        let target = target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .unwrap_or(target);
        if target.is_empty() {
            continue;
        }

        for param in parts {
            let param = param.trim().to_ascii_lowercase();
            if let Some(rel) = param.strip_prefix("rel=") {
                let rel = rel.trim_matches('"');
                if rel.split_whitespace().any(|r| r == "canonical") {
                    return Some(target.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_canonical() {
        let header = r#"<https://example.com/a>; rel="canonical""#;
        assert_eq!(canonical_from_link_header(header).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_multiple_links_scanned_independently() {
        let header = r#"<https://example.com/style.css>; rel="stylesheet", <https://example.com/a>; rel="canonical""#;
        assert_eq!(canonical_from_link_header(header).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_unquoted_rel() {
        let header = "<https://example.com/a>; rel=canonical";
        assert_eq!(canonical_from_link_header(header).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_rel_with_multiple_relations() {
        let header = r#"<https://example.com/a>; rel="canonical alternate""#;
        assert_eq!(canonical_from_link_header(header).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_no_canonical() {
        let header = r#"<https://example.com/next>; rel="next""#;
        assert_eq!(canonical_from_link_header(header), None);
    }

    #[test]
    fn test_rel_is_case_insensitive() {
        let header = r#"<https://example.com/a>; REL="Canonical""#;
        assert_eq!(canonical_from_link_header(header).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_empty_header() {
        assert_eq!(canonical_from_link_header(""), None);
    }
}
