use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::registration::DEFAULT_PAGE_SIZE;

/// 服务器配置 - 批量登记服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | . | 工作目录，下面的相对路径都基于它 |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | DOWNLOAD_ROOT | downloads | 抓取工具的输出目录 (目录读取来源) |
/// | WATERMARK_ROOT | watermarked | 水印图片输出目录 |
/// | TITLES_CSV | input.csv | 标题目录 (`id,titulo`) |
/// | STATE_DB | batch-state.redb | 会话与报表数据库 |
/// | FFMPEG_BIN | ffmpeg | 媒体处理工具 |
/// | WATERMARK_FONT | /usr/share/fonts/truetype/msttcorefonts/Verdana_Bold.ttf | 首选字体文件 |
/// | WATERMARK_FALLBACK_FONT | Verdana-Bold | 字体文件不存在时使用的系统字体名 (空 = 不回退) |
/// | WATERMARK_TEXT | - | 固定水印文字，未设置时使用 "标题 - 颜色" |
/// | WATERMARK_FONT_SIZE | 30 | 字号 |
/// | PAGE_SIZE | 25 | 每批商品数 |
/// | WC_BASE_URL 等 | - | 商店发布配置，见 [`PublishConfig`] |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/catalog HTTP_PORT=8080 cargo run -p batch-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: PathBuf,
    /// HTTP API 服务端口
    pub http_port: u16,
    pub download_root: PathBuf,
    pub watermark_root: PathBuf,
    pub titles_csv: PathBuf,
    pub state_db: PathBuf,
    /// 水印配置
    pub watermark: WatermarkConfig,
    /// 每批商品数
    pub page_size: usize,
    /// 商店发布配置 (全部变量设置时才启用)
    pub publish: Option<PublishConfig>,
    pub log_dir: Option<PathBuf>,
}

/// 水印工具配置
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    pub ffmpeg_bin: String,
    pub font: PathBuf,
    pub fallback_font: Option<String>,
    pub fixed_text: Option<String>,
    pub font_size: u32,
}

/// 商店 (WooCommerce) 发布配置
///
/// | 环境变量 | 说明 |
/// |----------|------|
/// | WC_BASE_URL | 商店地址 |
/// | WP_USER / WP_PASSWORD | 媒体库上传账号 (应用密码) |
/// | WC_CONSUMER_KEY / WC_CONSUMER_SECRET | 商品 API 密钥 |
/// | WC_BASE_PRODUCT_ID | 被复制的模板商品 |
#[derive(Clone)]
pub struct PublishConfig {
    pub base_url: String,
    pub wp_user: String,
    pub wp_password: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub base_product_id: u64,
    /// 重试退避基数 (2s · 2^n)
    pub retry_base: Duration,
}

impl std::fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishConfig")
            .field("base_url", &self.base_url)
            .field("wp_user", &self.wp_user)
            .field("base_product_id", &self.base_product_id)
            .finish_non_exhaustive()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 相对路径基于工作目录解析
fn resolve(work_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        work_dir.join(path)
    }
}

impl PublishConfig {
    /// 从环境变量加载，任一变量缺失则返回 None
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env_opt(name))
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            base_url: get("WC_BASE_URL")?.trim_end_matches('/').to_string(),
            wp_user: get("WP_USER")?,
            wp_password: get("WP_PASSWORD")?,
            consumer_key: get("WC_CONSUMER_KEY")?,
            consumer_secret: get("WC_CONSUMER_SECRET")?,
            base_product_id: get("WC_BASE_PRODUCT_ID")?.trim().parse().ok()?,
            retry_base: Duration::from_secs(2),
        })
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = PathBuf::from(env_or("WORK_DIR", "."));
        Self::with_work_dir(work_dir)
    }

    /// 以指定工作目录加载配置
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            http_port: env_parse("HTTP_PORT", 5000),
            download_root: resolve(&work_dir, &env_or("DOWNLOAD_ROOT", "downloads")),
            watermark_root: resolve(&work_dir, &env_or("WATERMARK_ROOT", "watermarked")),
            titles_csv: resolve(&work_dir, &env_or("TITLES_CSV", "input.csv")),
            state_db: resolve(&work_dir, &env_or("STATE_DB", "batch-state.redb")),
            watermark: WatermarkConfig {
                ffmpeg_bin: env_or("FFMPEG_BIN", "ffmpeg"),
                font: PathBuf::from(env_or(
                    "WATERMARK_FONT",
                    "/usr/share/fonts/truetype/msttcorefonts/Verdana_Bold.ttf",
                )),
                fallback_font: match std::env::var("WATERMARK_FALLBACK_FONT") {
                    Ok(v) if v.trim().is_empty() => None,
                    Ok(v) => Some(v),
                    Err(_) => Some("Verdana-Bold".to_string()),
                },
                fixed_text: env_opt("WATERMARK_TEXT"),
                font_size: env_parse("WATERMARK_FONT_SIZE", 30),
            },
            page_size: env_parse("PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
            publish: PublishConfig::from_env(),
            log_dir: env_opt("LOG_DIR").map(|d| resolve(&work_dir, &d)),
            work_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_relative_paths_resolve_against_work_dir() {
        let config = Config::with_work_dir("/srv/catalog");
        assert!(config.state_db.starts_with("/srv/catalog") || config.state_db.is_absolute());
        assert_eq!(resolve(Path::new("/srv"), "a/b"), PathBuf::from("/srv/a/b"));
        assert_eq!(resolve(Path::new("/srv"), "/abs"), PathBuf::from("/abs"));
    }

    #[test]
    fn test_publish_requires_every_variable() {
        let mut vars: HashMap<&str, &str> = HashMap::from([
            ("WC_BASE_URL", "https://shop.example/"),
            ("WP_USER", "Editor"),
            ("WP_PASSWORD", "app pass"),
            ("WC_CONSUMER_KEY", "ck"),
            ("WC_CONSUMER_SECRET", "cs"),
            ("WC_BASE_PRODUCT_ID", "42"),
        ]);
        let lookup = |vars: &HashMap<&'static str, &'static str>| {
            let vars = vars.clone();
            move |name: &str| vars.get(name).map(|v| v.to_string())
        };

        let config = PublishConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.base_url, "https://shop.example");
        assert_eq!(config.base_product_id, 42);

        vars.remove("WC_CONSUMER_SECRET");
        assert!(PublishConfig::from_lookup(lookup(&vars)).is_none());
    }
}
