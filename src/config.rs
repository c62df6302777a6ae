use std::fmt;
use std::net::SocketAddr;

use scraper::Selector;

use crate::dates::LocaleRegistry;

// ── Constants ────────────────────────────────────────────────────────────────

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9621";
const DEFAULT_FEED_URL: &str = "https://play.google.com/store/getreviews?authuser=0";
const DEFAULT_PERMALINK_HOST: &str = "https://play.google.com";
const DEFAULT_LOCALE: &str = "de";
const DEFAULT_USER_AGENT: &str = "play-review-crawler/0.1";

/// `onload` handler Google puts on the body of its captcha interstitial.
pub const CAPTCHA_ONLOAD: &str = "e=document.getElementById('captcha');if(e){e.focus();}";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

// ── Selector query ───────────────────────────────────────────────────────────

/// One tag + attribute lookup, e.g. `<div class="LXrl4c">`. The CSS selector
/// is compiled once on construction and reused by every lookup.
#[derive(Debug, Clone)]
pub struct Query {
    tag: String,
    attribute: Option<(String, String)>,
    selector: Option<Selector>,
}

impl Query {
    pub fn new(tag: &str, attribute: &str, value: &str) -> Self {
        Self::build(tag, Some((attribute.to_string(), value.to_string())))
    }

    pub fn class(tag: &str, class: &str) -> Self {
        Self::new(tag, "class", class)
    }

    pub fn tag(tag: &str) -> Self {
        Self::build(tag, None)
    }

    fn build(tag: &str, attribute: Option<(String, String)>) -> Self {
        let selector = compile(tag, attribute.as_ref());
        Self {
            tag: tag.to_string(),
            attribute,
            selector,
        }
    }

    /// Compiled selector, `None` when the query isn't valid CSS.
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }
}

/// Class lookups match a single class token so `class="d15Mdf xyz"` still
/// satisfies `Query::class("div", "d15Mdf")`.
fn compile(tag: &str, attribute: Option<&(String, String)>) -> Option<Selector> {
    let css = match attribute {
        Some((name, value)) if name == "class" => format!("{}[class~=\"{}\"]", tag, value),
        Some((name, value)) => format!("{}[{}=\"{}\"]", tag, name, value),
        None => tag.to_string(),
    };
    // Use .ok() immediately to drop SelectorErrorKind<'_> before css is dropped.
    let selector = Selector::parse(&css).ok();
    if selector.is_none() {
        tracing::warn!(selector = %css, "layout query is not a valid selector");
    }
    selector
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.attribute == other.attribute
    }
}

impl Eq for Query {}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some((name, value)) => write!(f, "<{} {}=\"{}\"></{}>", self.tag, name, value, self.tag),
            None => write!(f, "<{}></{}>", self.tag, self.tag),
        }
    }
}

// ── Page layouts ─────────────────────────────────────────────────────────────

/// Markup of the rendered app details page.
#[derive(Debug, Clone)]
pub struct StaticLayout {
    pub app_content: Query,
    pub main_content: Query,
    pub review_areas: Query,
    pub author: Query,
    pub date: Query,
    pub rating_image: Query,
    pub filled_star: Query,
    pub title: Query,
    pub body_short: Query,
    pub body_full: Query,
    pub expand_control: Query,
    pub app_url_meta: Query,
}

impl Default for StaticLayout {
    fn default() -> Self {
        Self {
            app_content: Query::class("div", "LXrl4c"),
            main_content: Query::class("div", "W4P4ne"),
            review_areas: Query::class("div", "d15Mdf"),
            author: Query::class("span", "X43Kjb"),
            date: Query::class("span", "p2TkOb"),
            rating_image: Query::new("div", "role", "img"),
            filled_star: Query::class("div", "vQHuPe"),
            title: Query::class("span", "IEFhEe"),
            body_short: Query::new("span", "jsname", "bN97Pc"),
            body_full: Query::new("span", "jsname", "fbQN7e"),
            expand_control: Query::tag("button"),
            app_url_meta: Query::new("meta", "property", "og:url"),
        }
    }
}

/// Markup of the paginated review feed.
#[derive(Debug, Clone)]
pub struct FeedLayout {
    pub review_block: Query,
    pub title: Query,
    pub date: Query,
    pub author: Query,
    pub permalink: Query,
    pub header: Query,
    pub review_id_attribute: String,
    pub current_rating: Query,
    pub permalink_host: String,
    pub captcha_onload: String,
}

impl Default for FeedLayout {
    fn default() -> Self {
        Self {
            review_block: Query::class("div", "single-review"),
            title: Query::class("span", "review-title"),
            date: Query::class("span", "review-date"),
            author: Query::class("span", "author-name"),
            permalink: Query::class("a", "reviews-permalink"),
            header: Query::class("div", "review-header"),
            review_id_attribute: "data-reviewid".to_string(),
            current_rating: Query::class("div", "current-rating"),
            permalink_host: DEFAULT_PERMALINK_HOST.to_string(),
            captcha_onload: CAPTCHA_ONLOAD.to_string(),
        }
    }
}

/// Fixed form fields posted to the feed endpoint; only the page number and
/// package identifier vary per request.
#[derive(Debug, Clone)]
pub struct FeedRequestConfig {
    pub url: String,
    pub review_type: String,
    pub sort_order: String,
    pub xhr: String,
    pub language: String,
}

impl Default for FeedRequestConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            review_type: "0".to_string(),
            sort_order: "0".to_string(),
            xhr: "1".to_string(),
            language: "en".to_string(),
        }
    }
}

impl FeedRequestConfig {
    pub fn form(&self, package_name: &str, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("reviewType", self.review_type.clone()),
            ("pageNum", page.to_string()),
            ("id", package_name.to_string()),
            ("reviewSortOrder", self.sort_order.clone()),
            ("xhr", self.xhr.clone()),
            ("hl", self.language.clone()),
        ]
    }
}

// ── Transport / crawl settings ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub insecure_ssl: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 10,
            max_redirects: 10,
            insecure_ssl: false,
        }
    }
}

/// Everything one crawl invocation reads; shared read-only between requests.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub static_layout: StaticLayout,
    pub feed_layout: FeedLayout,
    pub feed_request: FeedRequestConfig,
    pub locales: LocaleRegistry,
    pub default_locale: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            static_layout: StaticLayout::default(),
            feed_layout: FeedLayout::default(),
            feed_request: FeedRequestConfig::default(),
            locales: LocaleRegistry::default(),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub http: HttpConfig,
    pub crawl: CrawlSettings,
}

// ── Environment loading ──────────────────────────────────────────────────────

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, so tests can feed a map
    /// instead of touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        };

        let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
                None => Ok(default),
            }
        };

        let bind_raw = lookup("REVIEW_CRAWLER_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("REVIEW_CRAWLER_BIND", e.to_string()))?;

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            user_agent: lookup("REVIEW_CRAWLER_USER_AGENT").unwrap_or(defaults.user_agent),
            connect_timeout_secs: parse_u64(
                "REVIEW_CRAWLER_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            timeout_secs: parse_u64("REVIEW_CRAWLER_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_redirects: defaults.max_redirects,
            insecure_ssl: lookup("REVIEW_CRAWLER_INSECURE_SSL").as_deref() == Some("1"),
        };

        let mut crawl = CrawlSettings::default();
        if let Some(url) = lookup("REVIEW_CRAWLER_FEED_URL") {
            url::Url::parse(&url).map_err(|e| invalid("REVIEW_CRAWLER_FEED_URL", e.to_string()))?;
            crawl.feed_request.url = url;
        }
        if let Some(host) = lookup("REVIEW_CRAWLER_PERMALINK_HOST") {
            crawl.feed_layout.permalink_host = host.trim_end_matches('/').to_string();
        }
        if let Some(locale) = lookup("REVIEW_CRAWLER_DEFAULT_LOCALE") {
            if crawl.locales.lookup(&locale).is_none() {
                return Err(invalid(
                    "REVIEW_CRAWLER_DEFAULT_LOCALE",
                    format!("no month table registered for \"{}\"", locale),
                ));
            }
            crawl.default_locale = locale;
        }

        Ok(Self {
            bind_addr,
            http,
            crawl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = load(&[]).expect("defaults");
        assert_eq!(config.bind_addr.port(), 9621);
        assert_eq!(config.crawl.feed_request.url, DEFAULT_FEED_URL);
        assert_eq!(config.crawl.default_locale, "de");
        assert!(!config.http.insecure_ssl);
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("REVIEW_CRAWLER_BIND", "127.0.0.1:8080"),
            ("REVIEW_CRAWLER_FEED_URL", "http://localhost:1234/getreviews"),
            ("REVIEW_CRAWLER_PERMALINK_HOST", "https://example.test/"),
            ("REVIEW_CRAWLER_DEFAULT_LOCALE", "en"),
            ("REVIEW_CRAWLER_TIMEOUT_SECS", "30"),
            ("REVIEW_CRAWLER_INSECURE_SSL", "1"),
        ])
        .expect("config");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.crawl.feed_request.url, "http://localhost:1234/getreviews");
        assert_eq!(config.crawl.feed_layout.permalink_host, "https://example.test");
        assert_eq!(config.crawl.default_locale, "en");
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.http.insecure_ssl);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[("REVIEW_CRAWLER_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("REVIEW_CRAWLER_TIMEOUT_SECS"));

        let err = load(&[("REVIEW_CRAWLER_DEFAULT_LOCALE", "fr")]).unwrap_err();
        assert!(err.to_string().contains("fr"));
    }

    #[test]
    fn class_queries_match_a_class_token() {
        let query = Query::class("div", "d15Mdf");
        assert!(query.selector().is_some());
        assert!(Query::class("div", "bad\"value").selector().is_none());
        assert_eq!(query.to_string(), "<div class=\"d15Mdf\"></div>");
        assert_eq!(Query::tag("button").to_string(), "<button></button>");
    }

    #[test]
    fn feed_form_carries_page_and_package() {
        let form = FeedRequestConfig::default().form("com.example.app", 3);
        assert!(form.contains(&("pageNum", "3".to_string())));
        assert!(form.contains(&("id", "com.example.app".to_string())));
        assert!(form.contains(&("hl", "en".to_string())));
    }
}
