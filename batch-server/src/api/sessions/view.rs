//! Session views returned to the UI

use serde::Serialize;
use shared::models::{Annotation, MissingField, ProductListing};
use std::collections::BTreeSet;

use crate::catalog::{CatalogReader, DOWNLOADS_PREFIX};
use crate::registration::{IncompleteEntry, RegistrationState};

#[derive(Debug, Serialize)]
pub struct SlotView {
    pub position: usize,
    #[serde(flatten)]
    pub product: ProductListing,
    pub annotation: Option<Annotation>,
    /// A snapshot exists and matches the current selection
    pub processed: bool,
    pub published: bool,
    pub missing: BTreeSet<MissingField>,
}

/// One page of a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub collection: String,
    pub total_products: usize,
    pub page: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub slots: Vec<SlotView>,
    pub incomplete: Vec<IncompleteEntry>,
}

impl SessionView {
    pub fn build(state: &RegistrationState, page: Option<usize>) -> Self {
        let page = page
            .unwrap_or(state.current_page)
            .min(state.total_pages() - 1);
        let (slots, incomplete) = match state.page_bounds(page) {
            Some(bounds) => {
                let incomplete = state.compute_incomplete(*bounds.start(), *bounds.end());
                let slots = bounds
                    .map(|position| {
                        let slot = &state.slots[position];
                        SlotView {
                            position,
                            product: CatalogReader::listing(&slot.product, DOWNLOADS_PREFIX),
                            annotation: slot.annotation.clone(),
                            processed: slot.processed.is_some() && slot.diff().is_empty(),
                            published: slot.is_published(),
                            missing: slot.missing_fields(),
                        }
                    })
                    .collect();
                (slots, incomplete)
            }
            None => (Vec::new(), Vec::new()),
        };

        Self {
            collection: state.collection.clone(),
            total_products: state.len(),
            page,
            current_page: state.current_page,
            total_pages: state.total_pages(),
            page_size: state.page_size,
            slots,
            incomplete,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Position the command touched (the new position for a duplicate)
    pub affected: Option<usize>,
    pub session: SessionView,
}
