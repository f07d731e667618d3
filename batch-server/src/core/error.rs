use thiserror::Error;

use crate::storage::StorageError;

/// 启动阶段错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
