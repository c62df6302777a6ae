use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::FieldCause;

/// Date that couldn't be determined.
pub const UNPARSEABLE_DATE: i64 = -1;

/// "4. July 2020", after month substitution.
pub const STATIC_DATE_FORMAT: &str = "%d. %B %Y";
/// "July 4, 2020".
pub const FEED_DATE_FORMAT: &str = "%B %d, %Y";

const GERMAN_MONTHS: &[(&str, &str)] = &[
    ("Januar", "January"),
    ("Februar", "February"),
    ("März", "March"),
    ("April", "April"),
    ("Mai", "May"),
    ("Juni", "June"),
    ("Juli", "July"),
    ("August", "August"),
    ("September", "September"),
    ("Oktober", "October"),
    ("November", "November"),
    ("Dezember", "December"),
];

// ── Month tables ─────────────────────────────────────────────────────────────

/// Month names of one source locale and their English replacement.
#[derive(Debug, Clone, Default)]
pub struct MonthTable {
    substitutions: Vec<(String, String)>,
}

impl MonthTable {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let mut substitutions: Vec<(String, String)> = pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        // Longest first so a short name never clobbers part of a longer one.
        substitutions.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { substitutions }
    }

    pub fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (from, to) in &self.substitutions {
            if from != to {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    tables: HashMap<String, MonthTable>,
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        let mut registry = Self {
            tables: HashMap::new(),
        };
        registry.register("en", MonthTable::default());
        registry.register("de", MonthTable::new(GERMAN_MONTHS));
        registry
    }
}

impl LocaleRegistry {
    pub fn register(&mut self, locale: &str, table: MonthTable) {
        self.tables.insert(primary_subtag(locale), table);
    }

    /// Table for a language tag such as `de` or `de-DE`.
    pub fn lookup(&self, locale: &str) -> Option<&MonthTable> {
        self.tables.get(&primary_subtag(locale))
    }
}

fn primary_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ── Normalization ────────────────────────────────────────────────────────────

/// Canonical `YYYYMMDD` integer.
pub fn date_number(date: NaiveDate) -> Option<i64> {
    date.format("%Y%m%d").to_string().parse::<i64>().ok()
}

/// Parse a localized "D. Month YYYY" date.
pub fn normalize_static_date(text: &str, months: &MonthTable) -> Result<i64, FieldCause> {
    let english = months.substitute(text.trim());
    NaiveDate::parse_from_str(&english, STATIC_DATE_FORMAT)
        .ok()
        .and_then(date_number)
        .ok_or_else(|| FieldCause::Unparseable(text.trim().to_string()))
}

/// Parse a feed "Month D, YYYY" date, `UNPARSEABLE_DATE` on failure.
pub fn normalize_feed_date(text: &str) -> i64 {
    NaiveDate::parse_from_str(text.trim(), FEED_DATE_FORMAT)
        .ok()
        .and_then(date_number)
        .unwrap_or(UNPARSEABLE_DATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_static_date_is_substituted_then_parsed() {
        let registry = LocaleRegistry::default();
        let german = registry.lookup("de").expect("german table");
        assert_eq!(german.substitute("4. Juli 2020"), "4. July 2020");
        assert_eq!(normalize_static_date("4. Juli 2020", german), Ok(20200704));
        assert_eq!(normalize_static_date("12. März 2019", german), Ok(20190312));
    }

    #[test]
    fn english_static_date_needs_no_substitution() {
        let registry = LocaleRegistry::default();
        let english = registry.lookup("en-US").expect("english table");
        assert_eq!(normalize_static_date("1. December 2021", english), Ok(20211201));
    }

    #[test]
    fn unparseable_static_date_reports_the_text() {
        let registry = LocaleRegistry::default();
        let german = registry.lookup("de").expect("german table");
        assert_eq!(
            normalize_static_date("Juli 4, 2020", german),
            Err(FieldCause::Unparseable("Juli 4, 2020".to_string()))
        );
    }

    #[test]
    fn feed_date_parses_or_yields_sentinel() {
        assert_eq!(normalize_feed_date("July 4, 2020"), 20200704);
        assert_eq!(normalize_feed_date(" March 12, 2019 "), 20190312);
        assert_eq!(normalize_feed_date("4. Juli 2020"), UNPARSEABLE_DATE);
        assert_eq!(normalize_feed_date(""), UNPARSEABLE_DATE);
    }

    #[test]
    fn lookup_uses_primary_subtag() {
        let registry = LocaleRegistry::default();
        assert!(registry.lookup("de-DE").is_some());
        assert!(registry.lookup("DE").is_some());
        assert!(registry.lookup("fr").is_none());
    }
}
