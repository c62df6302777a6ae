use scraper::{ElementRef, Html};

use crate::config::{FeedLayout, StaticLayout};
use crate::dates::{self, MonthTable};
use crate::dom;
use crate::error::{Field, FieldCause, PackageNameError};
use crate::locate::{self, ReviewAreas};
use crate::models::ReviewRecord;
use crate::rating;

// ── Package name ─────────────────────────────────────────────────────────────

/// Read the package id from the page's `og:url` meta tag.
pub fn package_name(document: &Html, layout: &StaticLayout) -> Result<String, PackageNameError> {
    let content = dom::find(document.root_element(), &layout.app_url_meta)
        .and_then(|meta| dom::attribute(meta, "content"))
        .ok_or_else(|| PackageNameError::MetaNotFound(layout.app_url_meta.clone()))?;
    package_name_from_url(content)
}

/// `https://play.google.com/store/apps/details?id=com.example.app&hl=de` →
/// `com.example.app`. The last `id` pair wins.
pub fn package_name_from_url(app_url: &str) -> Result<String, PackageNameError> {
    let mut parts = app_url.split('?');
    let (Some(_), Some(query), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PackageNameError::MissingQueryParameters);
    };

    let mut package = "";
    for pair in query.split('&') {
        let mut kv = pair.split('=');
        if let (Some("id"), Some(value), None) = (kv.next(), kv.next(), kv.next()) {
            package = value;
        }
    }

    if package.is_empty() {
        return Err(PackageNameError::EmptyId);
    }
    Ok(package.to_string())
}

// ── Static-page reviews ──────────────────────────────────────────────────────

/// Build one record from a review element of the app page. Every field is
/// attempted on its own; failures are collected on the record.
pub fn static_review(
    review: ElementRef<'_>,
    package_name: &str,
    months: Result<&MonthTable, &str>,
    layout: &StaticLayout,
) -> ReviewRecord {
    let mut record = ReviewRecord::new(package_name);
    record.rating = rating::UNDECODED_STATIC_RATING;

    let areas = match locate::review_areas(review, layout) {
        Ok(areas) => areas,
        Err(err) => {
            for field in Field::AREA_FIELDS {
                record.settle(field, Err::<(), _>(FieldCause::Area(err.clone())), ());
            }
            return record;
        }
    };

    record.author = record.settle(Field::Author, author(&areas, layout), String::new());
    let date = match months {
        Ok(months) => date(&areas, layout, months),
        Err(locale) => Err(FieldCause::UnsupportedLocale(locale.to_string())),
    };
    record.date = record.settle(Field::Date, date, dates::UNPARSEABLE_DATE);
    record.rating = record.settle(
        Field::Rating,
        stars(&areas, layout),
        rating::UNDECODED_STATIC_RATING,
    );
    record.title = title(&areas, layout);
    record.body = record.settle(Field::Body, body(&areas, layout), String::new());

    record
}

fn author(areas: &ReviewAreas<'_>, layout: &StaticLayout) -> Result<String, FieldCause> {
    let block = dom::find(areas.headline, &layout.author)
        .ok_or_else(|| FieldCause::NotFound(layout.author.clone()))?;
    non_empty(dom::text(block))
}

fn date(areas: &ReviewAreas<'_>, layout: &StaticLayout, months: &MonthTable) -> Result<i64, FieldCause> {
    let block = dom::find(areas.headline, &layout.date)
        .ok_or_else(|| FieldCause::NotFound(layout.date.clone()))?;
    let text = non_empty(dom::text(block))?;
    dates::normalize_static_date(&text, months)
}

fn stars(areas: &ReviewAreas<'_>, layout: &StaticLayout) -> Result<i32, FieldCause> {
    let image = dom::find(areas.headline, &layout.rating_image)
        .ok_or_else(|| FieldCause::NotFound(layout.rating_image.clone()))?;
    rating::decode_filled_stars(image, &layout.filled_star)
}

/// Titles are optional, so a missing one is not an error.
fn title(areas: &ReviewAreas<'_>, layout: &StaticLayout) -> String {
    dom::find(areas.content, &layout.title)
        .map(dom::text)
        .unwrap_or_default()
}

fn body(areas: &ReviewAreas<'_>, layout: &StaticLayout) -> Result<String, FieldCause> {
    let short = dom::find(areas.content, &layout.body_short)
        .ok_or_else(|| FieldCause::NotFound(layout.body_short.clone()))?;

    // An expand control means the short text is truncated.
    if dom::find(short, &layout.expand_control).is_some() {
        let full = dom::find(areas.content, &layout.body_full)
            .ok_or(FieldCause::ShortenedWithoutFull)?;
        let text = dom::text(full);
        if !text.is_empty() {
            return Ok(text);
        }
    }

    let text = dom::own_text(short);
    if text.is_empty() {
        return Err(FieldCause::MissingText);
    }
    Ok(text)
}

fn non_empty(text: String) -> Result<String, FieldCause> {
    if text.is_empty() {
        Err(FieldCause::Empty)
    } else {
        Ok(text)
    }
}

// ── Feed reviews ─────────────────────────────────────────────────────────────

/// Build one record from a `single-review` block of the feed. Feed fields fall
/// back to empty values or sentinels without recording errors.
pub fn feed_review(block: ElementRef<'_>, package_name: &str, layout: &FeedLayout) -> ReviewRecord {
    let mut record = ReviewRecord::new(package_name);

    record.body = dom::find(block, &layout.title)
        .and_then(dom::next_sibling_text)
        .unwrap_or_default();
    record.date = dom::find(block, &layout.date)
        .map(|el| dates::normalize_feed_date(&dom::text(el)))
        .unwrap_or(dates::UNPARSEABLE_DATE);
    record.author = dom::find(block, &layout.author)
        .map(dom::text)
        .unwrap_or_default();
    record.perma_link = dom::find(block, &layout.permalink)
        .and_then(|a| dom::attribute(a, "href"))
        .map(|href| format!("{}{}", layout.permalink_host, href))
        .unwrap_or_default();
    record.review_id = dom::find(block, &layout.header)
        .and_then(|header| dom::attribute(header, &layout.review_id_attribute))
        .unwrap_or_default()
        .to_string();
    record.rating = dom::find(block, &layout.current_rating)
        .and_then(|el| dom::attribute(el, "style"))
        .map(rating::decode_style_width)
        .unwrap_or(rating::UNDECODABLE_FEED_RATING);

    record
}
