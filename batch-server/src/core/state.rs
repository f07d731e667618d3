use std::sync::Arc;

use crate::catalog::{CatalogReader, TitleCatalog};
use crate::core::{Config, Result};
use crate::publish::{Publisher, WooCommercePublisher};
use crate::report::ReportService;
use crate::sessions::SessionManager;
use crate::storage::Storage;
use crate::watermark::{FfmpegWatermarker, WatermarkApplier};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆一份。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | catalog | 下载目录读取 |
/// | titles | 标题目录 (启动时读取一次) |
/// | sessions | 登记会话 |
/// | report | 处理报告 |
/// | watermarker | 水印工具 |
/// | publisher | 商店发布 (可选) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub catalog: CatalogReader,
    pub titles: Arc<TitleCatalog>,
    /// Why the title catalog could not be read, if it could not
    pub titles_error: Option<String>,
    pub sessions: Arc<SessionManager>,
    pub report: ReportService,
    pub watermarker: Arc<dyn WatermarkApplier>,
    pub publisher: Option<Arc<dyn Publisher>>,
}

impl ServerState {
    /// 组装服务器状态
    ///
    /// 用于测试时注入替身实现
    pub fn new(
        config: Config,
        storage: Storage,
        titles: TitleCatalog,
        watermarker: Arc<dyn WatermarkApplier>,
        publisher: Option<Arc<dyn Publisher>>,
    ) -> Self {
        Self {
            catalog: CatalogReader::new(&config.download_root),
            titles: Arc::new(titles),
            titles_error: None,
            sessions: Arc::new(SessionManager::new(storage.clone(), config.page_size)),
            report: ReportService::new(storage, &config.work_dir),
            watermarker,
            publisher,
            config,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 打开 redb 数据库
    /// 2. 读取标题目录 (失败时继续运行，标题接口返回错误)
    /// 3. 创建水印工具与发布服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        if let Some(parent) = config.state_db.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Storage::open(&config.state_db)?;

        let (titles, titles_error) = match TitleCatalog::load(&config.titles_csv) {
            Ok(titles) => {
                tracing::info!(path = %config.titles_csv.display(), count = titles.len(), "Title catalog loaded");
                (titles, None)
            }
            Err(e) => {
                tracing::warn!(path = %config.titles_csv.display(), error = %e, "Title catalog unavailable");
                (TitleCatalog::default(), Some(e.to_string()))
            }
        };

        let watermarker = FfmpegWatermarker::new(config.watermark.clone());
        if !watermarker.is_available().await {
            tracing::warn!(bin = %config.watermark.ffmpeg_bin, "Watermark tool not available, previews will fail");
        }

        let publisher: Option<Arc<dyn Publisher>> = match &config.publish {
            Some(publish) => {
                let publisher = WooCommercePublisher::new(publish.clone())
                    .map_err(|e| anyhow::anyhow!("publisher setup failed: {e}"))?;
                tracing::info!(base_url = %publish.base_url, "Storefront publishing enabled");
                Some(Arc::new(publisher))
            }
            None => {
                tracing::info!("Storefront publishing not configured, running local-only");
                None
            }
        };

        let mut state = Self::new(
            config.clone(),
            storage,
            titles,
            Arc::new(watermarker),
            publisher,
        );
        state.titles_error = titles_error;
        Ok(state)
    }
}
