//! Tolerant single-pass tag scanner.
//!
//! Drives a callback with start-tag, end-tag, and text events over one
//! document's markup, without building a tree. The scanner is total over
//! arbitrary input: comments, doctypes, unclosed tags, stray `<`, and
//! malformed attributes are skipped or surfaced as text, never an error.
//! `<script>` and `<style>` content is treated as raw text up to the
//! matching close tag.

/// A parse event emitted during the single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    StartTag {
        /// Lowercased tag name.
        name: String,
        /// Attributes in source order, names lowercased, values raw.
        attrs: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag {
        /// Lowercased tag name.
        name: String,
    },
    Text(&'a str),
}

struct StartTagData {
    name: String,
    attrs: Vec<(String, Option<String>)>,
    self_closing: bool,
}

/// Scan `input` once, feeding every event to `sink`.
pub fn scan<F: FnMut(Event<'_>)>(input: &str, mut sink: F) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        if bytes[i] != b'<' {
            let end = next_lt(input, i + 1);
            sink(Event::Text(&input[i..end]));
            i = end;
            continue;
        }

        if input[i..].starts_with("<!--") {
            i = match input[i + 4..].find("-->") {
                Some(j) => i + 4 + j + 3,
                None => len,
            };
        } else if input[i..].starts_with("</") {
            let rest = &input[i + 2..];
            let name_len = tag_name_len(rest);
            let close = match rest.find('>') {
                Some(j) => i + 2 + j + 1,
                None => len,
            };
            if name_len > 0 {
                sink(Event::EndTag { name: rest[..name_len].to_ascii_lowercase() });
            }
            i = close;
        } else if input[i..].starts_with("<!") || input[i..].starts_with("<?") {
            // doctype, CDATA, processing instruction
            i = match input[i + 2..].find('>') {
                Some(j) => i + 2 + j + 1,
                None => len,
            };
        } else if i + 1 < len && bytes[i + 1].is_ascii_alphabetic() {
            let (tag, next) = parse_start_tag(input, i);
            i = next;
            let raw_text = !tag.self_closing && (tag.name == "script" || tag.name == "style");
            let close = format!("</{}", tag.name);
            sink(Event::StartTag { name: tag.name, attrs: tag.attrs, self_closing: tag.self_closing });
            if raw_text {
                // Raw content up to the matching close tag; '<' inside is data.
                match input[i..].to_ascii_lowercase().find(&close) {
                    Some(j) => {
                        if j > 0 {
                            sink(Event::Text(&input[i..i + j]));
                        }
                        i += j;
                    }
                    None => {
                        if i < len {
                            sink(Event::Text(&input[i..]));
                        }
                        i = len;
                    }
                }
            }
        } else {
            // A lone '<' that opens nothing is text.
            let end = next_lt(input, i + 1);
            sink(Event::Text(&input[i..end]));
            i = end;
        }
    }
}

fn next_lt(input: &str, from: usize) -> usize {
    match input[from..].find('<') {
        Some(j) => from + j,
        None => input.len(),
    }
}

fn tag_name_len(rest: &str) -> usize {
    rest.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b':')
        .count()
}

fn parse_start_tag(input: &str, start: usize) -> (StartTagData, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();

    let name_len = tag_name_len(&input[start + 1..]);
    let name = input[start + 1..start + 1 + name_len].to_ascii_lowercase();
    let mut i = start + 1 + name_len;

    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            // Unterminated tag: tolerate and emit what we have.
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                i += 1;
                if i < len && bytes[i] == b'>' {
                    self_closing = true;
                    i += 1;
                    break;
                }
                // stray slash between attributes
            }
            b'=' => {
                // valueless '=' with no attribute name
                i += 1;
            }
            _ => {
                let name_start = i;
                while i < len
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'='
                    && bytes[i] != b'>'
                    && bytes[i] != b'/'
                {
                    i += 1;
                }
                let attr_name = input[name_start..i].to_ascii_lowercase();

                while i < len && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }

                let value = if i < len && bytes[i] == b'=' {
                    i += 1;
                    while i < len && bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                        let quote = bytes[i];
                        i += 1;
                        let value_start = i;
                        while i < len && bytes[i] != quote {
                            i += 1;
                        }
                        let value = input[value_start..i].to_string();
                        if i < len {
                            i += 1; // closing quote
                        }
                        Some(value)
                    } else {
                        let value_start = i;
                        while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                            i += 1;
                        }
                        Some(input[value_start..i].to_string())
                    }
                } else {
                    None
                };

                attrs.push((attr_name, value));
            }
        }
    }

    (StartTagData { name, attrs, self_closing }, i)
}
