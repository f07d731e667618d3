//! Title catalog entry

use serde::{Deserialize, Serialize};

/// One row of the title catalog (`id,titulo`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleOption {
    pub id: i64,
    pub title: String,
}
