//! Preview entries and commit outcomes

use serde::{Deserialize, Serialize};

/// One product of the batch as shown on the preview screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub position: usize,
    /// `"<title> - <color>"`
    pub label: String,
    pub title: String,
    pub color: String,
    /// Watermarked primary image as a server path (`watermarked/<collection>/...`)
    pub primary: Option<String>,
    pub gallery: Vec<String>,
}

/// Result of committing one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// New images were watermarked and the snapshot was updated
    Processed {
        position: usize,
        watermarked: Vec<usize>,
        removed: Vec<usize>,
    },
    /// Selection unchanged since the last commit
    AlreadyProcessed { position: usize },
    /// At least one image failed; the snapshot was left as it was
    Failed {
        position: usize,
        failed_images: Vec<usize>,
        error: String,
    },
}

impl CommitOutcome {
    pub fn position(&self) -> usize {
        match self {
            Self::Processed { position, .. }
            | Self::AlreadyProcessed { position }
            | Self::Failed { position, .. } => *position,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Response of the preview endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub page: usize,
    pub entries: Vec<PreviewEntry>,
    pub outcomes: Vec<CommitOutcome>,
    pub succeeded: usize,
    pub already_processed: usize,
    pub failed: usize,
}

/// Response of the process endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Positions confirmed by an earlier call and left alone
    pub already_published: usize,
    pub next_page: usize,
    pub total_pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_tagged() {
        let json = serde_json::to_value(CommitOutcome::AlreadyProcessed { position: 4 }).unwrap();
        assert_eq!(json["status"], "already_processed");
        assert_eq!(json["position"], 4);
    }
}
