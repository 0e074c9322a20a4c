//! Rich text documents are stored as editor JSON and only turned into HTML
//! for display. Rendering escapes all text and keeps URLs to a safe set of
//! schemes.

use serde_json::Value;
use std::fmt::Write as _;

/// Renders an editor JSON document to sanitized HTML
pub fn to_html(doc: &Value) -> String {
    let mut out = String::new();
    render_node(doc, &mut out);
    out
}

/// Concatenated text content, with block boundaries as newlines
pub fn to_plain_text(doc: &Value) -> String {
    let mut out = String::new();
    collect_text(doc, &mut out);
    out.trim_end().to_string()
}

/// A missing note, `{}` and a doc without any text all count as empty
pub fn is_empty(doc: &Value) -> bool {
    to_plain_text(doc).trim().is_empty() && !contains_node(doc, "image")
}

pub fn empty_document() -> Value {
    Value::Object(Default::default())
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn children(node: &Value) -> &[Value] {
    node.get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn attr<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.get("attrs").and_then(|a| a.get(name))
}

fn attr_str<'a>(node: &'a Value, name: &str) -> Option<&'a str> {
    attr(node, name).and_then(Value::as_str)
}

fn render_children(node: &Value, out: &mut String) {
    for child in children(node) {
        render_node(child, out);
    }
}

fn wrap(tag: &str, node: &Value, out: &mut String) {
    let _ = write!(out, "<{}>", tag);
    render_children(node, out);
    let _ = write!(out, "</{}>", tag);
}

fn render_node(node: &Value, out: &mut String) {
    match node_type(node) {
        Some("text") => render_text(node, out),
        Some("paragraph") => wrap("p", node, out),
        Some("heading") => {
            let level = attr(node, "level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            wrap(&format!("h{}", level), node, out);
        }
        Some("hardBreak") => out.push_str("<br>"),
        Some("bulletList") => wrap("ul", node, out),
        Some("orderedList") => match attr(node, "start").and_then(Value::as_u64) {
            Some(start) if start > 1 => {
                let _ = write!(out, "<ol start=\"{}\">", start);
                render_children(node, out);
                out.push_str("</ol>");
            }
            _ => wrap("ol", node, out),
        },
        Some("listItem") => wrap("li", node, out),
        Some("blockquote") => wrap("blockquote", node, out),
        Some("codeBlock") => {
            out.push_str("<pre><code");
            if let Some(lang) = attr_str(node, "language").filter(|l| is_safe_token(l)) {
                let _ = write!(out, " class=\"language-{}\"", lang);
            }
            out.push('>');
            // marks are not meaningful inside code
            for child in children(node) {
                if let Some(text) = child.get("text").and_then(Value::as_str) {
                    out.push_str(&escape(text));
                }
            }
            out.push_str("</code></pre>");
        }
        Some("horizontalRule") => out.push_str("<hr>"),
        Some("image") => render_image(node, out),
        _ => render_children(node, out),
    }
}

fn render_image(node: &Value, out: &mut String) {
    let Some(src) = attr_str(node, "src").filter(|s| is_safe_url(s)) else {
        return;
    };
    let _ = write!(out, "<img src=\"{}\"", escape(src));
    if let Some(alt) = attr_str(node, "alt") {
        let _ = write!(out, " alt=\"{}\"", escape(alt));
    }
    if let Some(title) = attr_str(node, "title") {
        let _ = write!(out, " title=\"{}\"", escape(title));
    }
    out.push('>');
}

fn render_text(node: &Value, out: &mut String) {
    let text = node.get("text").and_then(Value::as_str).unwrap_or_default();
    let marks = node
        .get("marks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut closing: Vec<&'static str> = Vec::with_capacity(marks.len());
    for mark in marks {
        match node_type(mark) {
            Some("bold") => {
                out.push_str("<strong>");
                closing.push("</strong>");
            }
            Some("italic") => {
                out.push_str("<em>");
                closing.push("</em>");
            }
            Some("underline") => {
                out.push_str("<u>");
                closing.push("</u>");
            }
            Some("strike") => {
                out.push_str("<s>");
                closing.push("</s>");
            }
            Some("code") => {
                out.push_str("<code>");
                closing.push("</code>");
            }
            Some("link") => {
                if let Some(href) = attr_str(mark, "href").filter(|h| is_safe_url(h)) {
                    let _ = write!(
                        out,
                        "<a href=\"{}\" rel=\"noopener noreferrer nofollow\" target=\"_blank\">",
                        escape(href)
                    );
                    closing.push("</a>");
                }
            }
            _ => {}
        }
    }

    out.push_str(&escape(text));
    for tag in closing.iter().rev() {
        out.push_str(tag);
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node_type(node) {
        Some("text") => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Some("hardBreak") => out.push('\n'),
        Some("paragraph" | "heading" | "listItem" | "codeBlock" | "blockquote") => {
            for child in children(node) {
                collect_text(child, out);
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {
            for child in children(node) {
                collect_text(child, out);
            }
        }
    }
}

fn contains_node(node: &Value, kind: &str) -> bool {
    node_type(node) == Some(kind) || children(node).iter().any(|c| contains_node(c, kind))
}

fn is_safe_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

/// Allows `http`, `https`, `mailto` and site-relative paths
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.chars().any(|c| c.is_control()) {
        return false;
    }
    if url.starts_with('/') {
        // "//host" is protocol-relative, not site-relative
        return !url.starts_with("//") && !url.starts_with("/\\");
    }
    match url.split_once(':') {
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        None => false,
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn doc(content: Value) -> Value {
        json!({ "type": "doc", "content": content })
    }

    fn para(text: &str) -> Value {
        json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
    }

    #[test]
    fn renders_block_structure() {
        let d = doc(json!([
            { "type": "heading", "attrs": { "level": 2 }, "content": [{ "type": "text", "text": "Terms" }] },
            para("Net 30"),
            { "type": "bulletList", "content": [
                { "type": "listItem", "content": [para("one")] },
                { "type": "listItem", "content": [para("two")] }
            ]},
            { "type": "horizontalRule" }
        ]));
        assert_eq!(
            to_html(&d),
            "<h2>Terms</h2><p>Net 30</p><ul><li><p>one</p></li><li><p>two</p></li></ul><hr>"
        );
    }

    #[test]
    fn nests_marks_in_order() {
        let d = doc(json!([{ "type": "paragraph", "content": [
            { "type": "text", "text": "ship", "marks": [{ "type": "bold" }, { "type": "italic" }] },
            { "type": "hardBreak" },
            { "type": "text", "text": "asap", "marks": [{ "type": "code" }] }
        ]}]));
        assert_eq!(
            to_html(&d),
            "<p><strong><em>ship</em></strong><br><code>asap</code></p>"
        );
    }

    #[test]
    fn escapes_script_content() {
        let d = doc(json!([para("<script>alert('x')</script> & more")]));
        let html = to_html(&d);
        assert!(!html.contains("<script>"));
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn drops_javascript_links_but_keeps_text() {
        let d = doc(json!([{ "type": "paragraph", "content": [
            { "type": "text", "text": "click", "marks": [
                { "type": "link", "attrs": { "href": "javascript:alert(1)" } }
            ]}
        ]}]));
        assert_eq!(to_html(&d), "<p>click</p>");
    }

    #[test]
    fn keeps_safe_links() {
        let d = doc(json!([{ "type": "paragraph", "content": [
            { "type": "text", "text": "quote", "marks": [
                { "type": "link", "attrs": { "href": "https://example.com/?a=1&b=2" } }
            ]}
        ]}]));
        assert_eq!(
            to_html(&d),
            "<p><a href=\"https://example.com/?a=1&amp;b=2\" rel=\"noopener noreferrer nofollow\" target=\"_blank\">quote</a></p>"
        );
    }

    #[test]
    fn unknown_nodes_render_children() {
        let d = doc(json!([{ "type": "mention", "content": [para("inner")] }]));
        assert_eq!(to_html(&d), "<p>inner</p>");
    }

    #[test]
    fn image_with_private_preview_url() {
        let d = doc(json!([{ "type": "image", "attrs": {
            "src": "/file/preview/private/c1/supplier-interaction/i1/abc.png", "alt": "data \"sheet\""
        }}]));
        assert_eq!(
            to_html(&d),
            "<img src=\"/file/preview/private/c1/supplier-interaction/i1/abc.png\" alt=\"data &quot;sheet&quot;\">"
        );
    }

    #[test]
    fn code_block_language_is_sanitized() {
        let d = doc(json!([{ "type": "codeBlock", "attrs": { "language": "rust\" onload=\"x" },
            "content": [{ "type": "text", "text": "fn main() {}" }] }]));
        assert_eq!(to_html(&d), "<pre><code>fn main() {}</code></pre>");
    }

    #[rstest]
    #[case("https://carbon.example/x", true)]
    #[case("http://carbon.example", true)]
    #[case("mailto:buyer@example.com", true)]
    #[case("/file/preview/private/a.png", true)]
    #[case("HTTPS://EXAMPLE.COM", true)]
    #[case("javascript:alert(1)", false)]
    #[case("  JavaScript:alert(1)", false)]
    #[case("java\tscript:alert(1)", false)]
    #[case("data:text/html;base64,PHNjcmlwdD4=", false)]
    #[case("//evil.example/x", false)]
    #[case("relative/path", false)]
    #[case("", false)]
    fn url_allow_list(#[case] url: &str, #[case] allowed: bool) {
        assert_eq!(is_safe_url(url), allowed);
    }

    #[test]
    fn emptiness() {
        assert!(is_empty(&json!({})));
        assert!(is_empty(&doc(json!([{ "type": "paragraph" }]))));
        assert!(!is_empty(&doc(json!([para("x")]))));
    }

    #[test]
    fn plain_text_separates_blocks() {
        let d = doc(json!([para("first"), para("second")]));
        assert_eq!(to_plain_text(&d), "first\nsecond");
    }
}
