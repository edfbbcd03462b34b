//! HTML to plain text for pattern matching.
//!
//! `scraper::Html` is not `Send`; these helpers parse and drop the document
//! synchronously so callers never hold it across an `.await`.

use scraper::{ElementRef, Html, Node};

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "header", "footer", "blockquote", "pre", "dt", "dd", "address",
];

/// Visible text of `html` with runs of whitespace collapsed to one space.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut buf = String::with_capacity(html.len() / 4);
    collect_text(&doc.root_element(), &mut buf);
    collapse_whitespace(&buf)
}

fn collect_text(node: &ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    buf.push(' ');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, buf);
                }
                if block {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
