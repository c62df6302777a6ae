use serde::{Deserialize, Serialize};

use crate::error::{Field, FieldCause, FieldError};

/// One review as extracted from either page layout.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReviewRecord {
    pub review_id: String,
    pub package_name: String,
    pub author: String,
    /// `YYYYMMDD`, or `-1` when the date couldn't be parsed.
    #[serde(rename = "date_posted")]
    pub date: i64,
    pub rating: i32,
    pub title: String,
    pub body: String,
    pub perma_link: String,
    pub extraction_errors: Vec<FieldError>,
}

impl ReviewRecord {
    pub fn new(package_name: &str) -> Self {
        Self {
            review_id: String::new(),
            package_name: package_name.to_string(),
            author: String::new(),
            date: crate::dates::UNPARSEABLE_DATE,
            rating: 0,
            title: String::new(),
            body: String::new(),
            perma_link: String::new(),
            extraction_errors: Vec::new(),
        }
    }

    /// Keep the value on success, otherwise note the failure and use `fallback`.
    pub fn settle<T>(&mut self, field: Field, result: Result<T, FieldCause>, fallback: T) -> T {
        match result {
            Ok(value) => value,
            Err(cause) => {
                self.extraction_errors.push(FieldError::new(field, cause));
                fallback
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.extraction_errors.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct StaticParams {
    pub target_url: Option<String>,
}
