use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::Query;

// ── Structural errors ────────────────────────────────────────────────────────

/// An expected container is missing or too shallow. At page scope this aborts
/// the crawl; at review scope it only affects that review's record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("couldn't find the main container of the app, looking for last {0}")]
    AppContainerNotFound(Query),
    #[error("couldn't find the main content blocks in the main container, looking for first {0}")]
    MainContentNotFound(Query),
    #[error("container at level {level} should contain at least {required} children, found {found}")]
    TooFewChildren {
        level: usize,
        required: usize,
        found: usize,
    },
    #[error("couldn't find container for the areas of the review, looking for {0}")]
    ReviewAreasNotFound(Query),
    #[error("review areas container should contain at least 2 children, found {found}")]
    TooFewReviewAreas { found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackageNameError {
    #[error("cannot find meta of the app to parse package name, looking for {0}")]
    MetaNotFound(Query),
    #[error("app url should contain query parameters")]
    MissingQueryParameters,
    #[error("query parameter \"id\" of the app url is empty")]
    EmptyId,
}

// ── Field errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Date,
    Rating,
    Title,
    Body,
}

impl Field {
    /// Fields read from the headline or body area of a static-page review.
    pub const AREA_FIELDS: [Field; 5] = [
        Field::Author,
        Field::Date,
        Field::Rating,
        Field::Title,
        Field::Body,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::Date => "date",
            Field::Rating => "rating",
            Field::Title => "title",
            Field::Body => "body",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldCause {
    #[error("element not found, looking for {0}")]
    NotFound(Query),
    #[error("element is empty")]
    Empty,
    #[error("\"{0}\" couldn't be parsed")]
    Unparseable(String),
    #[error("unsupported locale \"{0}\"")]
    UnsupportedLocale(String),
    #[error("{0} is marking a filled star but there are none, please check the CSS class")]
    ZeroFilledStars(Query),
    #[error("the review was shortened but cant find the full review text")]
    ShortenedWithoutFull,
    #[error("cannot find the review text")]
    MissingText,
    #[error("{0}")]
    Area(StructuralError),
}

/// A single field that couldn't be extracted. The record is still emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub cause: FieldCause,
}

impl FieldError {
    pub fn new(field: Field, cause: FieldCause) -> Self {
        Self { field, cause }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property \"{}\" : {}", self.field.as_str(), self.cause)
    }
}

impl std::error::Error for FieldError {}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Page-level errors ────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("given link couldn't be fetched: {0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("URL did not return HTML")]
    NotHtml,
    #[error("{0}")]
    Structure(#[from] StructuralError),
    #[error("property \"packageName\" : {0}")]
    PackageName(#[from] PackageNameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_render_field_and_cause() {
        let err = FieldError::new(Field::Author, FieldCause::NotFound(Query::class("span", "X43Kjb")));
        assert_eq!(
            err.to_string(),
            "property \"author\" : element not found, looking for <span class=\"X43Kjb\"></span>"
        );
        assert_eq!(
            serde_json::to_value(&err).expect("serialize"),
            serde_json::Value::String(err.to_string())
        );
    }

    #[test]
    fn structural_errors_name_the_level() {
        let err = StructuralError::TooFewChildren {
            level: 2,
            required: 3,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "container at level 2 should contain at least 3 children, found 1"
        );
        let crawl: CrawlError = err.into();
        assert!(matches!(crawl, CrawlError::Structure(_)));
    }
}
