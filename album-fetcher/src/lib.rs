//! album-fetcher - 相册图片抓取工具
//!
//! Walks the paginated listing of a photo-album category, resolves every
//! product album on each page and downloads its images into
//! `<out>/<collection>/<page>/<product>/<hash>.<ext>`.
//!
//! # 模块结构
//!
//! ```text
//! album-fetcher/src/
//! ├── cli.rs            # 命令行参数 (clap)
//! ├── config.rs         # 常量、集合描述
//! ├── error.rs          # FetchError
//! ├── client.rs         # reqwest 客户端 + PageSource trait
//! ├── auth.rs           # 密码保护相册
//! ├── parse.rs          # HTML 解析 (纯函数)
//! ├── download.rs       # 单张图片下载 (重试 + 分辨率回退)
//! ├── runner.rs         # 抓取主循环与汇总
//! ├── audit.rs          # 在线/本地对比 (只读)
//! ├── fix_extensions.rs # .jpg/.jpeg 重复清理
//! └── logger.rs         # tracing 初始化
//! ```

pub mod audit;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod fix_extensions;
pub mod logger;
pub mod parse;
pub mod runner;

pub use audit::{CollectionAudit, PageAudit};
pub use client::{PageSource, YupooClient};
pub use config::{CollectionSpec, Delays};
pub use error::{FetchError, FetchResult};
pub use runner::{Crawler, RunSummary};
