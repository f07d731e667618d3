//! Operator annotations and processed snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Operator annotation for one product position
///
/// Invariant: `primary` holds at most one index and never shares an index
/// with `gallery`. The setters below keep it; fields are public only for
/// (de)serialization and reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub title_id: Option<i64>,
    pub color: Option<String>,
    #[serde(default)]
    pub primary: BTreeSet<usize>,
    #[serde(default)]
    pub gallery: BTreeSet<usize>,
}

/// Field a position is missing before it can be committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Title,
    Color,
    PrimaryImage,
}

impl Annotation {
    /// Mark or unmark `idx` as the primary image
    pub fn set_primary(&mut self, idx: usize, on: bool) {
        if on {
            self.gallery.remove(&idx);
            self.primary.clear();
            self.primary.insert(idx);
        } else {
            self.primary.remove(&idx);
        }
    }

    /// Mark or unmark `idx` as a gallery image
    pub fn set_gallery(&mut self, idx: usize, on: bool) {
        if on {
            self.primary.remove(&idx);
            self.gallery.insert(idx);
        } else {
            self.gallery.remove(&idx);
        }
    }

    pub fn primary_image(&self) -> Option<usize> {
        self.primary.iter().next().copied()
    }

    /// Union of primary and gallery indices
    pub fn selection(&self) -> BTreeSet<usize> {
        self.primary.union(&self.gallery).copied().collect()
    }

    pub fn missing_fields(&self) -> BTreeSet<MissingField> {
        let mut missing = BTreeSet::new();
        if self.title_id.is_none() {
            missing.insert(MissingField::Title);
        }
        if self.color.as_deref().is_none_or(|c| c.trim().is_empty()) {
            missing.insert(MissingField::Color);
        }
        if self.primary.is_empty() {
            missing.insert(MissingField::PrimaryImage);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Selection recorded the last time a position went through watermarking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSnapshot {
    pub selected: BTreeSet<usize>,
    pub processed_at: i64,
}

/// Images to watermark (`added`) and watermarks to clean up (`removed`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDiff {
    pub added: Vec<usize>,
    pub removed: Vec<usize>,
}

impl SelectionDiff {
    pub fn between(previous: Option<&BTreeSet<usize>>, current: &BTreeSet<usize>) -> Self {
        match previous {
            None => Self {
                added: current.iter().copied().collect(),
                removed: Vec::new(),
            },
            Some(prev) => Self {
                added: current.difference(prev).copied().collect(),
                removed: prev.difference(current).copied().collect(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
