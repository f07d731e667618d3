//! batch-server - 商品批量登记服务
//!
//! # 架构概述
//!
//! 操作员在浏览器中为抓取下来的商品逐批 (默认 25 个) 选择标题、颜色、
//! 主图和图集，预览时为新选中的图片打水印，确认后发布到商店并写入报告。
//!
//! - **目录** (`catalog`): 读取抓取工具的输出目录和标题 CSV
//! - **登记** (`registration`): 会话状态、命令、批次提交
//! - **水印** (`watermark`): ffmpeg drawtext
//! - **发布** (`publish`): WooCommerce (可选)
//! - **存储** (`storage`): redb 会话与报告
//! - **HTTP API** (`api`): axum 路由 + 内嵌前端
//!
//! # 模块结构
//!
//! ```text
//! batch-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── catalog/       # 目录读取
//! ├── registration/  # 登记状态机
//! ├── watermark/     # 水印
//! ├── publish/       # 商店发布
//! ├── sessions.rs    # 会话管理
//! ├── report.rs      # 处理报告
//! ├── storage.rs     # redb
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod publish;
pub mod registration;
pub mod report;
pub mod sessions;
pub mod storage;
pub mod utils;
pub mod watermark;

pub use core::{Config, Server, ServerState};
pub use registration::{RegistrationCommand, RegistrationState};
pub use utils::logger::init_logger_with_file;

pub fn print_banner() {
    println!(
        r#"
    ____        __       __
   / __ )____ _/ /______/ /_
  / __  / __ `/ __/ ___/ __ \
 / /_/ / /_/ / /_/ /__/ / / /
/_____/\__,_/\__/\___/_/ /_/
    "#
    );
}
