/// Which upstream the raw bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Rendered app details page.
    Static,
    /// HTML fragment embedded in the escaped JSON of the review feed.
    Feed,
}

const BOLD_MARKERS: &[&str] = &["<b>", "</b>"];
const LINE_BREAKS: &[&str] = &["<br>", "<br/>", "<br />"];

// Order matters: `\"` must be resolved after the unicode escapes.
const FEED_ESCAPES: &[(&str, &str)] = &[
    ("\\u003c", "<"),
    ("\\u003e", ">"),
    ("\\u0026", "&"),
    ("\\u003d", "="),
    ("\\\"", "\""),
];

/// Repair the known encoding artifacts so the markup parses as intended.
/// Never fails; missing patterns are left alone.
pub fn normalize_page(raw: &[u8], kind: PageKind) -> String {
    let mut page = String::from_utf8_lossy(raw).into_owned();

    for marker in BOLD_MARKERS {
        page = page.replace(marker, "");
    }
    for tag in LINE_BREAKS {
        page = page.replace(tag, "\n");
    }

    if kind == PageKind::Feed {
        for (escaped, literal) in FEED_ESCAPES {
            page = page.replace(escaped, literal);
        }
    }

    page
}
