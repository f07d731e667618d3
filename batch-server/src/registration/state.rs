//! Registration state of one operator session
//!
//! Products and their annotations live together in one ordered list of
//! [`Slot`]s, so a structural change (duplicate, delete) moves a product,
//! its annotation and its processed snapshot as one unit. Every position
//! above the change is renumbered implicitly by the `Vec` shift.

use serde::{Deserialize, Serialize};
use shared::models::{Annotation, MissingField, ProcessedSnapshot, Product, SelectionDiff};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use super::error::{RegistrationError, RegistrationResult};

/// Bumped whenever the stored layout changes; older states are discarded
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// One product of the working list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub product: Product,
    #[serde(default)]
    pub annotation: Option<Annotation>,
    /// Selection as of the last successful watermark run
    #[serde(default)]
    pub processed: Option<ProcessedSnapshot>,
    /// Set when the batch was confirmed for this product; cleared by the
    /// next watermark run
    #[serde(default)]
    pub published_at: Option<i64>,
}

impl Slot {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            annotation: None,
            processed: None,
            published_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Current primary + gallery selection
    pub fn selection(&self) -> BTreeSet<usize> {
        self.annotation
            .as_ref()
            .map(Annotation::selection)
            .unwrap_or_default()
    }

    pub fn missing_fields(&self) -> BTreeSet<MissingField> {
        self.annotation
            .as_ref()
            .map(Annotation::missing_fields)
            .unwrap_or_else(|| Annotation::default().missing_fields())
    }

    pub fn diff(&self) -> SelectionDiff {
        SelectionDiff::between(
            self.processed.as_ref().map(|p| &p.selected),
            &self.selection(),
        )
    }
}

/// A position that cannot be committed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteEntry {
    pub position: usize,
    pub name: String,
    pub missing: BTreeSet<MissingField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationState {
    pub schema_version: u32,
    pub collection: String,
    pub slots: Vec<Slot>,
    /// origin key -> number of duplicates ever made (never decremented)
    #[serde(default)]
    pub duplicate_counters: BTreeMap<String, u32>,
    /// Zero-based batch index
    #[serde(default)]
    pub current_page: usize,
    pub page_size: usize,
}

impl RegistrationState {
    pub fn new(collection: impl Into<String>, products: Vec<Product>, page_size: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            collection: collection.into(),
            slots: products.into_iter().map(Slot::new).collect(),
            duplicate_counters: BTreeMap::new(),
            current_page: 0,
            page_size: page_size.max(1),
        }
    }

    /// Whether a stored state can be resumed for `collection`
    pub fn is_compatible(&self, collection: &str) -> bool {
        self.schema_version == SCHEMA_VERSION && self.collection == collection
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        self.slots.len().div_ceil(self.page_size).max(1)
    }

    /// Inclusive position bounds of a page, `None` for an empty page
    pub fn page_bounds(&self, page: usize) -> Option<RangeInclusive<usize>> {
        let start = page.checked_mul(self.page_size)?;
        if start >= self.slots.len() {
            return None;
        }
        let end = (start + self.page_size).min(self.slots.len()) - 1;
        Some(start..=end)
    }

    pub fn slot(&self, position: usize) -> RegistrationResult<&Slot> {
        self.slots
            .get(position)
            .ok_or(RegistrationError::PositionOutOfRange {
                position,
                len: self.slots.len(),
            })
    }

    fn slot_mut(&mut self, position: usize) -> RegistrationResult<&mut Slot> {
        let len = self.slots.len();
        self.slots
            .get_mut(position)
            .ok_or(RegistrationError::PositionOutOfRange { position, len })
    }

    fn annotation_mut(&mut self, position: usize) -> RegistrationResult<&mut Annotation> {
        Ok(self
            .slot_mut(position)?
            .annotation
            .get_or_insert_with(Annotation::default))
    }

    fn check_image(&self, position: usize, image: usize) -> RegistrationResult<()> {
        let count = self.slot(position)?.product.images.len();
        if image >= count {
            return Err(RegistrationError::ImageIndexOutOfRange {
                position,
                image,
                count,
            });
        }
        Ok(())
    }

    pub fn set_title(&mut self, position: usize, title_id: Option<i64>) -> RegistrationResult<()> {
        self.annotation_mut(position)?.title_id = title_id;
        Ok(())
    }

    pub fn set_color(&mut self, position: usize, color: Option<String>) -> RegistrationResult<()> {
        let color = color.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        self.annotation_mut(position)?.color = color;
        Ok(())
    }

    pub fn set_primary(&mut self, position: usize, image: usize, on: bool) -> RegistrationResult<()> {
        self.check_image(position, image)?;
        self.annotation_mut(position)?.set_primary(image, on);
        Ok(())
    }

    pub fn set_gallery(&mut self, position: usize, image: usize, on: bool) -> RegistrationResult<()> {
        self.check_image(position, image)?;
        self.annotation_mut(position)?.set_gallery(image, on);
        Ok(())
    }

    /// Insert a blank copy right after `position`; returns the new position
    ///
    /// The copy's folder gets `_copy`, `_copy2`, … from a counter shared by
    /// every copy of the same source product.
    pub fn duplicate(&mut self, position: usize) -> RegistrationResult<usize> {
        let original = self.slot(position)?.product.clone();
        let counter = self
            .duplicate_counters
            .entry(original.origin_key())
            .or_insert(0);
        *counter += 1;
        let suffix = if *counter == 1 {
            "_copy".to_string()
        } else {
            format!("_copy{}", *counter)
        };
        let copy = original.duplicated_as(format!("{}{}", original.source_name, suffix));

        self.slots.insert(position + 1, Slot::new(copy));
        Ok(position + 1)
    }

    /// Remove `position`, shifting everything above it down by one
    pub fn delete(&mut self, position: usize) -> RegistrationResult<Slot> {
        self.slot(position)?;
        let removed = self.slots.remove(position);
        let last_page = self.total_pages() - 1;
        self.current_page = self.current_page.min(last_page);
        Ok(removed)
    }

    pub fn go_to_page(&mut self, page: usize) -> RegistrationResult<()> {
        let total = self.total_pages();
        if page >= total {
            return Err(RegistrationError::PageOutOfRange { page, total });
        }
        self.current_page = page;
        Ok(())
    }

    /// Positions in `start..=end` (clamped to the list) missing a title, a
    /// color or a primary image
    pub fn compute_incomplete(&self, start: usize, end: usize) -> Vec<IncompleteEntry> {
        if self.slots.is_empty() || start > end {
            return Vec::new();
        }
        let end = end.min(self.slots.len() - 1);
        (start..=end)
            .filter_map(|position| {
                let slot = &self.slots[position];
                let missing = slot.missing_fields();
                (!missing.is_empty()).then(|| IncompleteEntry {
                    position,
                    name: slot.product.name.clone(),
                    missing,
                })
            })
            .collect()
    }

    /// Images to watermark and to clean up at `position`
    pub fn diff_for_processing(&self, position: usize) -> RegistrationResult<SelectionDiff> {
        Ok(self.slot(position)?.diff())
    }

    /// Record the current selection as processed
    pub fn record_processed(&mut self, position: usize) -> RegistrationResult<()> {
        let slot = self.slot_mut(position)?;
        slot.processed = Some(ProcessedSnapshot {
            selected: slot.selection(),
            processed_at: shared::util::now_millis(),
        });
        slot.published_at = None;
        Ok(())
    }

    /// Record that `position` went out with the confirmed batch
    pub fn mark_published(&mut self, position: usize) -> RegistrationResult<()> {
        self.slot_mut(position)?.published_at = Some(shared::util::now_millis());
        Ok(())
    }

    /// Advance to the next batch, staying on the last one
    pub fn advance_page(&mut self) -> usize {
        self.current_page = (self.current_page + 1).min(self.total_pages() - 1);
        self.current_page
    }
}
