//! Small adapter over `scraper` giving tag+attribute lookups on a parsed page.

use scraper::node::Node;
use scraper::ElementRef;

use crate::config::Query;

/// First descendant of `scope` matching `query`, in document order.
pub fn find<'a>(scope: ElementRef<'a>, query: &Query) -> Option<ElementRef<'a>> {
    let selector = query.selector()?;
    scope.select(selector).next()
}

/// Every descendant of `scope` matching `query`, in document order.
pub fn find_all<'a>(scope: ElementRef<'a>, query: &Query) -> Vec<ElementRef<'a>> {
    match query.selector() {
        Some(selector) => scope.select(selector).collect(),
        None => Vec::new(),
    }
}

/// Immediate element children; text and comment nodes are skipped.
pub fn children(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// All descendant text, trimmed.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of the direct text children only, trimmed. Nested controls such as an
/// expand button do not contribute.
pub fn own_text(el: ElementRef<'_>) -> String {
    let mut parts = String::new();
    for child in el.children() {
        if let Node::Text(text) = child.value() {
            parts.push_str(&text.text);
        }
    }
    parts.trim().to_string()
}

pub fn attribute<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Text of the node right after `el`: the raw text for a text node, the
/// collected text for an element.
pub fn next_sibling_text(el: ElementRef<'_>) -> Option<String> {
    let sibling = el.next_sibling()?;
    match sibling.value() {
        Node::Text(text) => Some(text.text.trim().to_string()),
        Node::Element(_) => ElementRef::wrap(sibling).map(text),
        _ => None,
    }
}
