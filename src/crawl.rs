use scraper::Html;

use crate::config::{CrawlSettings, FeedLayout, Query};
use crate::dates::MonthTable;
use crate::dom;
use crate::error::CrawlError;
use crate::extract;
use crate::fetch::{self, ReviewClient};
use crate::locate;
use crate::models::ReviewRecord;
use crate::normalize::{normalize_page, PageKind};

/// Statuses the feed answers with once there is nothing left or we are
/// being throttled.
pub const TERMINAL_STATUSES: &[u16] = &[400, 403, 404, 408, 429];

// TODO: the feed loop stops after the first page. Raising this to walk
// further pages needs sign-off from the store integration owners first.
const PAGES_PER_CRAWL: u32 = 1;

// ── Static-page crawl ────────────────────────────────────────────────────────

/// Crawl the reviews rendered on one app page.
pub async fn crawl_static(
    client: &ReviewClient,
    settings: &CrawlSettings,
    url: &str,
) -> Result<Vec<ReviewRecord>, CrawlError> {
    fetch::validate_url(url)?;
    let raw = client.fetch_page(url).await?;
    let reviews = extract_static_page(&raw, settings)?;
    tracing::info!(url, reviews = reviews.len(), "static page crawled");
    Ok(reviews)
}

/// Extract every review of an already fetched app page. Page-level failures
/// abort with no records; review-level failures stay on the records.
pub fn extract_static_page(
    raw: &[u8],
    settings: &CrawlSettings,
) -> Result<Vec<ReviewRecord>, CrawlError> {
    let layout = &settings.static_layout;
    let document = Html::parse_document(&normalize_page(raw, PageKind::Static));

    let package_name = extract::package_name(&document, layout)?;
    let container = locate::review_container(&document, layout)?;

    let locale = page_locale(&document, settings);
    let months: Result<&MonthTable, &str> = settings.locales.lookup(&locale).ok_or(locale.as_str());
    if months.is_err() {
        tracing::warn!(locale = %locale, "no month table for page locale, dates will not be parsed");
    }

    let reviews: Vec<ReviewRecord> = dom::children(container)
        .into_iter()
        .map(|review| extract::static_review(review, &package_name, months, layout))
        .collect();

    let partial = reviews.iter().filter(|r| !r.is_complete()).count();
    if partial > 0 {
        tracing::debug!(package = %package_name, partial, "reviews with field errors");
    }
    Ok(reviews)
}

/// Language of the page from `<html lang>`, or the configured default.
fn page_locale(document: &Html, settings: &CrawlSettings) -> String {
    dom::attribute(document.root_element(), "lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(settings.default_locale.as_str())
        .to_string()
}

// ── Feed crawl ───────────────────────────────────────────────────────────────

/// Why a feed crawl stopped. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No response at all.
    Transport,
    /// One of [`TERMINAL_STATUSES`].
    Status(u16),
    BodyRead,
    Captcha,
    /// The page held no review blocks.
    Exhausted,
    LimitReached,
    /// The per-invocation page budget is used up.
    PageBudget,
}

#[derive(Debug)]
pub struct FeedCrawl {
    pub reviews: Vec<ReviewRecord>,
    pub stop: StopReason,
    pub pages: u32,
}

/// Per-invocation pagination bookkeeping.
#[derive(Debug)]
struct PaginationState {
    page: u32,
    limit: usize,
    reviews: Vec<ReviewRecord>,
}

impl PaginationState {
    fn new(limit: usize) -> Self {
        Self {
            page: 0,
            limit,
            reviews: Vec::new(),
        }
    }

    fn next_page(&mut self) -> u32 {
        self.page += 1;
        self.page
    }

    fn is_full(&self) -> bool {
        self.limit > 0 && self.reviews.len() >= self.limit
    }

    fn remaining(&self) -> Option<usize> {
        (self.limit > 0).then(|| self.limit.saturating_sub(self.reviews.len()))
    }

    fn finish(self, stop: StopReason) -> FeedCrawl {
        FeedCrawl {
            reviews: self.reviews,
            stop,
            pages: self.page,
        }
    }
}

/// Outcome of reading one feed page.
#[derive(Debug)]
pub enum FeedPage {
    Captcha,
    Reviews(Vec<ReviewRecord>),
}

/// Crawl the review feed of `package_name`, keeping at most `limit` reviews
/// (0 = no limit).
pub async fn crawl_feed(
    client: &ReviewClient,
    settings: &CrawlSettings,
    package_name: &str,
    limit: usize,
) -> FeedCrawl {
    let mut state = PaginationState::new(limit);

    loop {
        let page = state.next_page();

        let response = match client
            .post_feed(&settings.feed_request, package_name, page)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(package = %package_name, page, error = %e, "feed request failed");
                return state.finish(StopReason::Transport);
            }
        };

        let status = response.status().as_u16();
        if TERMINAL_STATUSES.contains(&status) {
            tracing::info!(package = %package_name, page, status, "no more reviews");
            return state.finish(StopReason::Status(status));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(package = %package_name, page, error = %e, "feed body unreadable");
                return state.finish(StopReason::BodyRead);
            }
        };

        let reviews = match read_feed_page(&body, package_name, &settings.feed_layout, state.remaining()) {
            FeedPage::Captcha => {
                tracing::warn!(package = %package_name, page, "captcha requested, stopping");
                return state.finish(StopReason::Captcha);
            }
            FeedPage::Reviews(reviews) => reviews,
        };

        if reviews.is_empty() {
            tracing::info!(package = %package_name, page, "feed exhausted");
            return state.finish(StopReason::Exhausted);
        }

        tracing::debug!(package = %package_name, page, reviews = reviews.len(), "feed page read");
        state.reviews.extend(reviews);

        if state.is_full() {
            return state.finish(StopReason::LimitReached);
        }
        if state.page >= PAGES_PER_CRAWL {
            return state.finish(StopReason::PageBudget);
        }
    }
}

/// Parse one feed response. Synchronous so the parsed document never lives
/// across an await point.
pub fn read_feed_page(
    raw: &[u8],
    package_name: &str,
    layout: &FeedLayout,
    remaining: Option<usize>,
) -> FeedPage {
    let document = Html::parse_document(&normalize_page(raw, PageKind::Feed));

    let onload = dom::find(document.root_element(), &Query::tag("body"))
        .and_then(|body| dom::attribute(body, "onload"));
    if onload == Some(layout.captcha_onload.as_str()) {
        return FeedPage::Captcha;
    }

    let blocks = locate::feed_review_blocks(&document, layout);
    let take = remaining.unwrap_or(blocks.len());
    FeedPage::Reviews(
        blocks
            .into_iter()
            .take(take)
            .map(|block| extract::feed_review(block, package_name, layout))
            .collect(),
    )
}
