//! HTTP 客户端
//!
//! [`PageSource`] is the seam between the crawl logic and the network:
//! [`YupooClient`] implements it with reqwest, tests implement it with
//! canned pages.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use std::sync::Arc;
use url::Url;

use crate::config::{self, IMAGE_TIMEOUT, PAGE_TIMEOUT};
use crate::error::{FetchError, FetchResult};

/// Where pages and image bytes come from
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch an HTML page
    async fn page(&self, url: &str) -> FetchResult<String>;

    /// Fetch raw image bytes
    async fn image(&self, url: &str) -> FetchResult<Vec<u8>>;

    /// Whether `url` answers a HEAD request with an image
    async fn serves_image(&self, url: &str) -> bool;

    /// Fetch a JSON document
    async fn json(&self, url: &str) -> FetchResult<serde_json::Value>;

    /// Install the album password cookie for the site of `url`
    fn set_password_cookie(&self, url: &str, password: &str);
}

/// reqwest-backed [`PageSource`] with a cookie jar shared by all requests
pub struct YupooClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl YupooClient {
    pub fn new(referer: &str) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(config::ACCEPT_LANGUAGE),
        );
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self { http, jar })
    }

    async fn get_checked(
        &self,
        url: &str,
        timeout: std::time::Duration,
    ) -> FetchResult<reqwest::Response> {
        let resp = self.http.get(url).timeout(timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl PageSource for YupooClient {
    async fn page(&self, url: &str) -> FetchResult<String> {
        let resp = self.get_checked(url, PAGE_TIMEOUT).await?;
        Ok(resp.text().await?)
    }

    async fn image(&self, url: &str) -> FetchResult<Vec<u8>> {
        let resp = self.get_checked(url, IMAGE_TIMEOUT).await?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        Ok(bytes.to_vec())
    }

    async fn serves_image(&self, url: &str) -> bool {
        match self.http.head(url).timeout(PAGE_TIMEOUT).send().await {
            Ok(resp) => {
                let is_image = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.to_ascii_lowercase().contains("image"));
                resp.status().is_success() && is_image
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "HEAD request failed");
                false
            }
        }
    }

    async fn json(&self, url: &str) -> FetchResult<serde_json::Value> {
        let resp = self.get_checked(url, PAGE_TIMEOUT).await?;
        Ok(resp.json().await?)
    }

    fn set_password_cookie(&self, url: &str, password: &str) {
        let Ok(parsed) = Url::parse(url) else {
            return;
        };
        // Site subdomains share the lock cookie through the parent domain
        let domain = parsed
            .host_str()
            .and_then(|h| h.split_once('.').map(|(_, parent)| parent.to_string()))
            .unwrap_or_default();
        let cookie = if domain.is_empty() {
            format!("indexlockcode={password}; Path=/")
        } else {
            format!("indexlockcode={password}; Domain=.{domain}; Path=/")
        };
        self.jar.add_cookie_str(&cookie, &parsed);
    }
}
