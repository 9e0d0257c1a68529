use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Tags kept verbatim in sanitized report output.
const ALLOWED_TAGS: &[&str] = &[
    "a", "article", "b", "blockquote", "br", "caption", "code", "dd", "div", "dl", "dt", "em",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "li", "ol", "p",
    "pre", "section", "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "u", "ul",
];

/// Tags removed together with their entire subtree.
const DROPPED_SUBTREES: &[&str] = &[
    "head", "iframe", "noscript", "object", "embed", "script", "style", "svg", "template", "title",
];

const ALLOWED_ATTRS: &[&str] = &[
    "alt", "class", "colspan", "height", "href", "id", "rowspan", "src", "title", "width",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

pub trait ReportSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Allowlist sanitizer for backend-generated report HTML.
///
/// Walks the parsed tree and re-serializes it: allowed elements keep their
/// safe attributes, unknown elements are unwrapped (children survive, the
/// tag does not), and active content is removed subtree and all. Raw
/// newlines are collapsed first because the backend templates escape them
/// into the markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeFilterSanitizer;

impl ReportSanitizer for TreeFilterSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let flattened = html.replace(['\n', '\r'], " ");
        let doc = Html::parse_document(&flattened);
        let mut out = String::with_capacity(flattened.len());
        write_node(&mut out, doc.tree.root());
        collapse_spaces(&out)
    }
}

/// Sanitize `report_html` with the default sanitizer.
pub fn sanitize_report_html(html: &str) -> String {
    TreeFilterSanitizer.sanitize(html)
}

fn write_node(out: &mut String, node: NodeRef<'_, Node>) {
    match node.value() {
        Node::Text(text) => push_escaped(out, text, false),
        Node::Element(element) => {
            let name = element.name();
            if DROPPED_SUBTREES.contains(&name) {
                return;
            }
            let keep_tag = ALLOWED_TAGS.contains(&name);
            if keep_tag {
                out.push('<');
                out.push_str(name);
                for (attr, value) in element.attrs() {
                    if attr_is_safe(attr, value) {
                        out.push(' ');
                        out.push_str(attr);
                        out.push_str("=\"");
                        push_escaped(out, value, true);
                        out.push('"');
                    }
                }
                out.push('>');
            }
            for child in node.children() {
                write_node(out, child);
            }
            if keep_tag && !VOID_TAGS.contains(&name) {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        // Document/fragment roots carry no markup of their own.
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(out, child);
            }
        }
        // Comments, doctypes, processing instructions are dropped.
        _ => {}
    }
}

fn attr_is_safe(attr: &str, value: &str) -> bool {
    if attr.starts_with("on") || !ALLOWED_ATTRS.contains(&attr) {
        return false;
    }
    if attr == "href" || attr == "src" {
        return url_is_safe(value);
    }
    true
}

fn url_is_safe(value: &str) -> bool {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed.starts_with("javascript:") || trimmed.starts_with("vbscript:") {
        return false;
    }
    if trimmed.starts_with("data:") {
        return trimmed.starts_with("data:image/");
    }
    true
}

fn push_escaped(out: &mut String, text: &str, in_attr: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !last_was_space {
                out.push(ch);
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::sanitize_report_html;

    #[test]
    fn scripts_are_removed_with_their_bodies() {
        let html = "<div>ok</div><script>alert('x')</script>";
        assert_eq!(sanitize_report_html(html), "<div>ok</div>");
    }

    #[test]
    fn event_handlers_and_script_urls_are_stripped() {
        let html = r#"<a href="javascript:steal()" onclick="steal()" title="t">link</a>"#;
        assert_eq!(sanitize_report_html(html), r#"<a title="t">link</a>"#);
    }

    #[test]
    fn report_tables_survive_intact() {
        let html = r#"<table><tr><th colspan="2">Cluster</th></tr><tr><td>login</td><td>17</td></tr></table>"#;
        let clean = sanitize_report_html(html);
        assert!(clean.contains(r#"<th colspan="2">Cluster</th>"#));
        assert!(clean.contains("<td>17</td>"));
    }

    #[test]
    fn unknown_tags_are_unwrapped_not_dropped() {
        let html = "<widget><p>body</p></widget>";
        assert_eq!(sanitize_report_html(html), "<p>body</p>");
    }

    #[test]
    fn newlines_are_collapsed() {
        let html = "<p>line\none</p>\n<p>two</p>";
        assert_eq!(sanitize_report_html(html), "<p>line one</p> <p>two</p>");
    }

    #[test]
    fn head_content_does_not_leak() {
        let html = "<html><head><title>t</title><style>p{}</style></head><body><p>x</p></body></html>";
        assert_eq!(sanitize_report_html(html), "<p>x</p>");
    }

    #[test]
    fn data_image_urls_are_allowed() {
        let html = r#"<img src="data:image/png;base64,AAA="><img src="data:text/html,x">"#;
        let clean = sanitize_report_html(html);
        assert!(clean.contains("data:image/png"));
        assert!(!clean.contains("data:text/html"));
    }
}
