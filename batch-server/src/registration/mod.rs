//! 批次登记
//!
//! Per-session working list of products with their annotations, duplicate
//! counters and processed snapshots.
//!
//! - [`state`] - 状态与不变量
//! - [`command`] - 操作命令
//! - [`commit`] - 批次提交 (水印) 与预览

pub mod command;
pub mod commit;
pub mod error;
pub mod state;

pub use command::{RegistrationCommand, apply_command};
pub use commit::{CommitContext, build_preview, commit_page, label_for};
pub use error::{RegistrationError, RegistrationResult};
pub use state::{DEFAULT_PAGE_SIZE, IncompleteEntry, RegistrationState, SCHEMA_VERSION, Slot};
