//! 抓取配置
//!
//! Timing and retry constants, plus the description of one collection
//! to fetch (from the command line or from a `fetch-many` JSON list).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};

/// 单张图片最大尝试次数 (每个分辨率)
pub const IMAGE_RETRIES: u32 = 3;
/// 商品页整体重试次数
pub const PRODUCT_RETRIES: u32 = 3;
/// 列表页 / 商品页超时
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
/// 图片下载超时
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

/// Image host and the resolution tiers tried in order
pub const IMAGE_HOST: &str = "photo.yupoo.com";
pub const IMAGE_TIERS: &[&str] = &["large", "medium"];

/// Fallback collection name when nothing can be detected
pub const DEFAULT_COLLECTION: &str = "Downloads";

/// Pauses between requests
///
/// `retry_unit` is multiplied by the attempt number between image retries.
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    pub between_products: Duration,
    pub between_images: Duration,
    pub retry_unit: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            between_products: Duration::from_millis(500),
            between_images: Duration::from_millis(300),
            retry_unit: Duration::from_secs(2),
        }
    }
}

impl Delays {
    /// No pauses at all (tests)
    pub fn none() -> Self {
        Self {
            between_products: Duration::ZERO,
            between_images: Duration::ZERO,
            retry_unit: Duration::ZERO,
        }
    }
}

/// One category to fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub url: String,
    /// Explicit collection name; detected from the page when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_page", alias = "start_page")]
    pub start: u32,
    #[serde(default = "default_page", alias = "end_page")]
    pub end: u32,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_page() -> u32 {
    1
}

impl CollectionSpec {
    pub fn validate(&self) -> FetchResult<()> {
        if self.start == 0 || self.end < self.start {
            return Err(FetchError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        url::Url::parse(&self.url).map_err(|_| FetchError::InvalidUrl(self.url.clone()))?;
        Ok(())
    }

    /// Category URL without query string or trailing slash
    pub fn base_url(&self) -> &str {
        let url = self.url.split('?').next().unwrap_or(&self.url);
        url.trim_end_matches('/')
    }

    pub fn page_url(&self, page: u32) -> String {
        format!("{}?page={}", self.base_url(), page)
    }
}

/// Load a `fetch-many` collection list
pub fn load_collections(path: &Path) -> FetchResult<Vec<CollectionSpec>> {
    let raw = std::fs::read_to_string(path)?;
    let specs: Vec<CollectionSpec> = serde_json::from_str(&raw)?;
    for spec in &specs {
        spec.validate()?;
    }
    Ok(specs)
}
