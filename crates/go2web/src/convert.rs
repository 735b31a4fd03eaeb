//! Body post-processing: JSON prettification and HTML to text

use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Subtrees that never contribute readable text
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "template", "iframe", "head",
];

/// Elements that start on a new line
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "tr", "table",
    "section", "article", "main", "header", "footer", "nav", "aside", "blockquote", "pre",
    "form", "dt", "dd", "figcaption", "title",
];

/// Check if a content type names JSON
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Re-serialize JSON text with four-space indentation
///
/// Returns `None` when `text` is not valid JSON.
pub fn prettify_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    to_pretty_json(&value).ok()
}

/// Serialize any value with the same four-space indentation
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Check if a body looks like an HTML document
pub fn is_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(512).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<body")
}

/// Reduce an HTML document to readable text
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut buf = String::new();
    collect_text(doc.root_element(), &mut buf);
    clean_whitespace(&buf)
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, buf);
                }
                if block {
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse whitespace runs, trim lines, keep at most one blank line
pub fn clean_whitespace(s: &str) -> String {
    let mut result = String::new();
    let mut last_was_space = false;
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            if result.ends_with(' ') {
                result.pop();
            }
            newline_count += 1;
            last_was_space = true;
            if newline_count <= 2 {
                result.push(c);
            }
        } else if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            newline_count = 0;
            last_was_space = false;
            result.push(c);
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json_content_type() {
        assert!(is_json_content_type(Some("application/json")));
        assert!(is_json_content_type(Some(
            "application/json; charset=utf-8"
        )));
        assert!(is_json_content_type(Some("Application/JSON")));
        assert!(!is_json_content_type(Some("text/html")));
        assert!(!is_json_content_type(None));
    }

    #[test]
    fn test_prettify_json() {
        assert_eq!(
            prettify_json(r#"{"a":1}"#),
            Some("{\n    \"a\": 1\n}".to_string())
        );
        assert_eq!(
            prettify_json(r#"[1,{"b":[]}]"#),
            Some("[\n    1,\n    {\n        \"b\": []\n    }\n]".to_string())
        );
        assert_eq!(prettify_json("not json"), None);
        assert_eq!(prettify_json(""), None);
    }

    #[test]
    fn test_prettify_json_keeps_key_order() {
        let pretty = prettify_json(r#"{"z":1,"a":2}"#).unwrap();
        assert!(pretty.find("\"z\"").unwrap() < pretty.find("\"a\"").unwrap());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("<!DOCTYPE html><html>"));
        assert!(is_html("  <!doctype HTML>"));
        assert!(is_html("<html><body>"));
        assert!(is_html("<div>x</div><body>y</body>"));
        assert!(!is_html("Hello world"));
        assert!(!is_html("{\"json\": true}"));
    }

    #[test]
    fn test_html_to_text() {
        let html = r#"<!DOCTYPE html>
<html>
<head><title>Ignored</title><style>body { color: red; }</style></head>
<body>
    <h1>Title</h1>
    <p>Paragraph   with <b>bold</b> text.</p>
    <script>alert('bad');</script>
    <ul><li>One</li><li>Two</li></ul>
</body>
</html>"#;
        let text = html_to_text(html);
        assert!(text.starts_with("Title"));
        assert!(text.contains("Paragraph with bold text."));
        assert!(text.contains("One\n"));
        assert!(text.contains("Two"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color"));
        assert!(!text.contains("Ignored"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        let text = html_to_text("<p>Fish &amp; chips &lt;3</p>");
        assert_eq!(text, "Fish & chips <3");
    }

    #[test]
    fn test_clean_whitespace() {
        let input = "  hello   world  \n\n\n\n  test  ";
        assert_eq!(clean_whitespace(input), "hello world\n\ntest");
    }
}
