use std::time::Duration;

use url::Url;

use crate::config::{FeedRequestConfig, HttpConfig};
use crate::error::CrawlError;

// ── Client ───────────────────────────────────────────────────────────────────

/// HTTP access to the store. Built once and shared; every crawl invocation
/// issues its own sequential requests through it.
#[derive(Debug, Clone)]
pub struct ReviewClient {
    client: reqwest::Client,
}

impl ReviewClient {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("de-DE,de;q=0.9,en;q=0.8"),
        );

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        if config.insecure_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET a rendered app page and return its body.
    pub async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CrawlError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                CrawlError::Request(format!("ConnectError: {}", e))
            } else {
                CrawlError::Request(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Upstream(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.contains("text/html") {
            return Err(CrawlError::NotHtml);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CrawlError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }

    /// POST one page request to the review feed. The raw response is handed
    /// back so the crawl loop can classify status and body failures itself.
    pub async fn post_feed(
        &self,
        feed: &FeedRequestConfig,
        package_name: &str,
        page: u32,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(&feed.url)
            .form(&feed.form(package_name, page))
            .send()
            .await
    }
}

// ── URL validation ───────────────────────────────────────────────────────────

pub fn validate_url(url: &str) -> Result<Url, CrawlError> {
    let parsed =
        Url::parse(url).map_err(|_| CrawlError::InvalidUrl(format!("Invalid URL: {}", url)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(CrawlError::InvalidUrl(
            "Only http and https URLs are allowed".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_web_urls_are_accepted() {
        assert!(validate_url("https://play.google.com/store/apps/details?id=com.whatsapp").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/page").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(CrawlError::InvalidUrl(_))
        ));
        assert!(matches!(validate_url("not a url"), Err(CrawlError::InvalidUrl(_))));
    }
}
