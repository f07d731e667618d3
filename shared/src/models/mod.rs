//! Data models
//!
//! Shared between batch-server, album-fetcher and the frontend (via API).
//! Image indices are positions in `Product::images`; product positions are
//! positions in the session's product list.

pub mod annotation;
pub mod preview;
pub mod product;
pub mod report;
pub mod title;

// Re-exports
pub use annotation::*;
pub use preview::*;
pub use product::*;
pub use report::*;
pub use title::*;
