//! Canonical identity signals from fetched markup.
//!
//! A single pass over the tag stream collects the page title, the canonical
//! link, the Open Graph url/title, and the meta description. Only those five
//! signals are ever needed, so there is no tree and no backtracking; the
//! scanner feeds a small state machine and malformed markup yields partial
//! or empty results instead of errors.

pub mod headers;
pub mod scanner;

pub use headers::canonical_from_link_header;

use scanner::Event;

/// Signals extracted from one document. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub canonical_url: Option<String>,
    pub og_url: Option<String>,
    pub og_title: Option<String>,
    pub description: Option<String>,
}

/// Extract identity signals from markup.
///
/// Total over arbitrary input. The title is only taken from text inside
/// both `<head>` and `<title>`; if the tags recur, the last non-blank text
/// wins. Skipping blank runs is a deliberate deviation from strict
/// last-text-wins overwrite semantics: whitespace after inline markup in a
/// title would otherwise clear the text already seen. `rel`, `property`,
/// and `name` values are compared case-insensitively (the looser of the
/// behaviors the signals are seen with in the wild).
pub fn extract_metadata(html: &str) -> ExtractionResult {
    let mut out = ExtractionResult::default();
    let mut in_head = false;
    let mut in_title = false;

    scanner::scan(html, |event| match event {
        Event::StartTag { name, attrs, .. } => match name.as_str() {
            "head" => in_head = true,
            "title" => in_title = true,
            "link" => {
                if attr(&attrs, "rel").is_some_and(|rel| rel.eq_ignore_ascii_case("canonical"))
                    && let Some(href) = attr(&attrs, "href").filter(|h| !h.is_empty())
                {
                    out.canonical_url = Some(href.to_string());
                }
            }
            "meta" => {
                let content = attr(&attrs, "content").filter(|c| !c.is_empty());
                if let Some(property) = attr(&attrs, "property") {
                    if property.eq_ignore_ascii_case("og:url") {
                        out.og_url = content.map(str::to_string);
                    } else if property.eq_ignore_ascii_case("og:title") {
                        out.og_title = content.map(str::to_string);
                    }
                }
                if attr(&attrs, "name").is_some_and(|n| n.eq_ignore_ascii_case("description")) {
                    out.description = content.map(str::to_string);
                }
            }
            _ => {}
        },
        Event::EndTag { name } => match name.as_str() {
            "head" => in_head = false,
            "title" => in_title = false,
            _ => {}
        },
        Event::Text(text) => {
            if in_head && in_title {
                let text = text.trim();
                if !text.is_empty() {
                    out.title = Some(text.to_string());
                }
            }
        }
    });

    out
}

/// Last value for an attribute name, mirroring how repeated attributes
/// collapse in a map.
fn attr<'a>(attrs: &'a [(String, Option<String>)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_head() {
        let html = r#"<head><title>Hello World</title><link rel="canonical" href="https://ex.com/a"><meta property="og:url" content="https://ex.com/b"></head>"#;
        let result = extract_metadata(html);
        assert_eq!(result.title.as_deref(), Some("Hello World"));
        assert_eq!(result.canonical_url.as_deref(), Some("https://ex.com/a"));
        assert_eq!(result.og_url.as_deref(), Some("https://ex.com/b"));
    }

    #[test]
    fn test_title_outside_head_ignored() {
        let result = extract_metadata("<body><title>Ignored</title></body>");
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_title_without_head_ignored() {
        let result = extract_metadata("<title>Ignored</title>");
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_og_title_and_description() {
        let html = r#"<head>
            <meta property="og:title" content="OG Title">
            <meta name="Description" content="A page.">
        </head>"#;
        let result = extract_metadata(html);
        assert_eq!(result.og_title.as_deref(), Some("OG Title"));
        assert_eq!(result.description.as_deref(), Some("A page."));
    }

    #[test]
    fn test_rel_and_property_case_insensitive() {
        let html = r#"<head><link rel="CANONICAL" href="https://ex.com/c"><meta property="OG:URL" content="https://ex.com/d"></head>"#;
        let result = extract_metadata(html);
        assert_eq!(result.canonical_url.as_deref(), Some("https://ex.com/c"));
        assert_eq!(result.og_url.as_deref(), Some("https://ex.com/d"));
    }

    #[test]
    fn test_recurring_title_last_wins() {
        let html = "<head><title>First</title><title>Second</title></head>";
        let result = extract_metadata(html);
        assert_eq!(result.title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_title_with_inline_markup_keeps_last_text() {
        let html = "<head><title>Hi <b>there</b></title></head>";
        let result = extract_metadata(html);
        assert_eq!(result.title.as_deref(), Some("there"));
    }

    #[test]
    fn test_script_content_not_title() {
        let html = "<head><script>var t = '<title>fake</title>';</script><title>Real</title></head>";
        let result = extract_metadata(html);
        assert_eq!(result.title.as_deref(), Some("Real"));
    }

    #[test]
    fn test_unrelated_meta_ignored() {
        let html = r#"<head><meta charset="utf-8"><meta name="viewport" content="width=device-width"></head>"#;
        let result = extract_metadata(html);
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_malformed_markup_is_partial_not_fatal() {
        let html = r#"<head><title>Ok</title><link rel="canonical" href="#;
        let result = extract_metadata(html);
        assert_eq!(result.title.as_deref(), Some("Ok"));
        assert_eq!(result.canonical_url, None);
    }

    #[test]
    fn test_empty_and_garbage_inputs() {
        assert_eq!(extract_metadata(""), ExtractionResult::default());
        assert_eq!(extract_metadata("<<<not html at all"), ExtractionResult::default());
    }

    #[test]
    fn test_link_without_href_ignored() {
        let result = extract_metadata(r#"<head><link rel="canonical"></head>"#);
        assert_eq!(result.canonical_url, None);
    }
}
