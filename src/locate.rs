use scraper::{ElementRef, Html};

use crate::config::{FeedLayout, StaticLayout};
use crate::dom;
use crate::error::StructuralError;

/// Headline (author, date, stars) and content (title, body) of one review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewAreas<'a> {
    pub headline: ElementRef<'a>,
    pub content: ElementRef<'a>,
}

/// Walk the app page down to the element whose children are the reviews.
///
/// The page can hold several app containers; only the last one is live.
pub fn review_container<'a>(
    document: &'a Html,
    layout: &StaticLayout,
) -> Result<ElementRef<'a>, StructuralError> {
    let app = dom::find_all(document.root_element(), &layout.app_content)
        .pop()
        .ok_or_else(|| StructuralError::AppContainerNotFound(layout.app_content.clone()))?;

    let main = dom::find(app, &layout.main_content)
        .ok_or_else(|| StructuralError::MainContentNotFound(layout.main_content.clone()))?;

    let block = nth_child(main, 1, 1)?;
    nth_child(block, 2, 2)
}

fn nth_child(el: ElementRef<'_>, index: usize, level: usize) -> Result<ElementRef<'_>, StructuralError> {
    let children = dom::children(el);
    children
        .get(index)
        .copied()
        .ok_or(StructuralError::TooFewChildren {
            level,
            required: index + 1,
            found: children.len(),
        })
}

/// Every review block of a feed page, in document order.
pub fn feed_review_blocks<'a>(document: &'a Html, layout: &FeedLayout) -> Vec<ElementRef<'a>> {
    dom::find_all(document.root_element(), &layout.review_block)
}

pub fn review_areas<'a>(
    review: ElementRef<'a>,
    layout: &StaticLayout,
) -> Result<ReviewAreas<'a>, StructuralError> {
    let container = dom::find(review, &layout.review_areas)
        .ok_or_else(|| StructuralError::ReviewAreasNotFound(layout.review_areas.clone()))?;

    let areas = dom::children(container);
    match areas.as_slice() {
        [headline, content, ..] => Ok(ReviewAreas {
            headline: *headline,
            content: *content,
        }),
        _ => Err(StructuralError::TooFewReviewAreas { found: areas.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StaticLayout {
        StaticLayout::default()
    }

    #[test]
    fn container_comes_from_the_last_app_block() {
        let doc = Html::parse_document(
            r#"<div class="LXrl4c"><div class="W4P4ne"><div></div><div><div></div><div></div><div id="stale"></div></div></div></div>
               <div class="LXrl4c"><div class="W4P4ne"><div></div><div><div></div><div></div><div id="live"></div></div></div></div>"#,
        );
        let container = review_container(&doc, &layout()).expect("container");
        assert_eq!(dom::attribute(container, "id"), Some("live"));
    }

    #[test]
    fn missing_app_block_is_reported() {
        let doc = Html::parse_document("<div class=\"other\"></div>");
        assert!(matches!(
            review_container(&doc, &layout()),
            Err(StructuralError::AppContainerNotFound(_))
        ));
    }

    #[test]
    fn missing_main_content_is_reported() {
        let doc = Html::parse_document("<div class=\"LXrl4c\"><div></div></div>");
        assert!(matches!(
            review_container(&doc, &layout()),
            Err(StructuralError::MainContentNotFound(_))
        ));
    }

    #[test]
    fn shallow_levels_are_reported_with_their_level() {
        let doc = Html::parse_document(r#"<div class="LXrl4c"><div class="W4P4ne"><div></div></div></div>"#);
        assert_eq!(
            review_container(&doc, &layout()).unwrap_err(),
            StructuralError::TooFewChildren {
                level: 1,
                required: 2,
                found: 1
            }
        );

        let doc = Html::parse_document(
            r#"<div class="LXrl4c"><div class="W4P4ne"><div></div><div><div></div><div></div></div></div></div>"#,
        );
        assert_eq!(
            review_container(&doc, &layout()).unwrap_err(),
            StructuralError::TooFewChildren {
                level: 2,
                required: 3,
                found: 2
            }
        );
    }

    #[test]
    fn review_areas_need_two_children() {
        let doc = Html::parse_document(
            r#"<div id="r"><div class="d15Mdf"><div id="head"></div><div id="body"></div><div></div></div></div>"#,
        );
        let areas = review_areas(doc.root_element(), &layout()).expect("areas");
        assert_eq!(dom::attribute(areas.headline, "id"), Some("head"));
        assert_eq!(dom::attribute(areas.content, "id"), Some("body"));

        let doc = Html::parse_document(r#"<div class="d15Mdf"><div></div></div>"#);
        assert_eq!(
            review_areas(doc.root_element(), &layout()).unwrap_err(),
            StructuralError::TooFewReviewAreas { found: 1 }
        );

        let doc = Html::parse_document("<div></div>");
        assert!(matches!(
            review_areas(doc.root_element(), &layout()),
            Err(StructuralError::ReviewAreasNotFound(_))
        ));
    }

    #[test]
    fn feed_blocks_are_flat() {
        let doc = Html::parse_document(
            r#"<div class="single-review"></div><div><div class="single-review"></div></div>"#,
        );
        assert_eq!(feed_review_blocks(&doc, &FeedLayout::default()).len(), 2);
    }
}
