//! Page commit
//!
//! Watermarks the newly selected images of every position in a page and
//! removes outputs of images that were deselected since the last run. A
//! position is only snapshotted when all of its images went through, so a
//! failed position is retried in full on the next commit.

use shared::models::{Annotation, CommitOutcome, PreviewEntry};
use std::ops::RangeInclusive;
use std::path::Path;

use super::error::{RegistrationError, RegistrationResult};
use super::state::RegistrationState;
use crate::catalog::TitleCatalog;
use crate::watermark::WatermarkApplier;

/// URL prefix under which watermarked outputs are served
pub const WATERMARKED_PREFIX: &str = "watermarked";

pub struct CommitContext<'a> {
    pub watermarker: &'a dyn WatermarkApplier,
    pub titles: &'a TitleCatalog,
    /// Download tree (sources)
    pub source_root: &'a Path,
    /// Watermarked tree (outputs)
    pub output_root: &'a Path,
}

fn title_text(annotation: &Annotation, titles: &TitleCatalog) -> String {
    match annotation.title_id {
        Some(id) => titles
            .get(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{id}")),
        None => String::new(),
    }
}

/// `"<title> - <color>"`
pub fn label_for(annotation: &Annotation, titles: &TitleCatalog) -> String {
    format!(
        "{} - {}",
        title_text(annotation, titles),
        annotation.color.as_deref().unwrap_or_default()
    )
}

/// Commit positions `start..=end`
///
/// Rejects the whole page before any watermark call when a position is
/// incomplete. Otherwise returns one outcome per position.
pub async fn commit_page(
    state: &mut RegistrationState,
    start: usize,
    end: usize,
    ctx: &CommitContext<'_>,
) -> RegistrationResult<Vec<CommitOutcome>> {
    if start >= state.len() || start > end {
        return Err(RegistrationError::PageOutOfRange {
            page: start / state.page_size,
            total: state.total_pages(),
        });
    }
    let end = end.min(state.len() - 1);

    let incomplete = state.compute_incomplete(start, end);
    if !incomplete.is_empty() {
        tracing::info!(start, end, incomplete = incomplete.len(), "Commit rejected, page incomplete");
        return Err(RegistrationError::Incomplete(incomplete));
    }

    let mut outcomes = Vec::with_capacity(end - start + 1);
    for position in start..=end {
        let slot = state.slot(position)?;
        let diff = slot.diff();
        if diff.is_empty() {
            outcomes.push(CommitOutcome::AlreadyProcessed { position });
            continue;
        }

        let product = &slot.product;
        let label = slot
            .annotation
            .as_ref()
            .map(|a| label_for(a, ctx.titles))
            .unwrap_or_default();

        let mut failed_images = Vec::new();
        let mut first_error: Option<String> = None;

        for &image in &diff.added {
            let (Some(source), Some(output)) = (product.source_image(image), product.output_image(image))
            else {
                failed_images.push(image);
                first_error.get_or_insert_with(|| format!("Image {image} does not exist"));
                continue;
            };
            let source = ctx.source_root.join(source);
            let dest = ctx.output_root.join(output);
            if let Err(e) = ctx.watermarker.apply(&source, &dest, &label).await {
                tracing::warn!(position, image, error = %e, "Watermark failed");
                failed_images.push(image);
                first_error.get_or_insert_with(|| e.to_string());
            }
        }

        for &image in &diff.removed {
            let Some(output) = product.output_image(image) else {
                continue;
            };
            if let Err(e) = ctx.watermarker.remove(&ctx.output_root.join(output)).await {
                tracing::warn!(position, image, error = %e, "Failed to remove stale output");
                failed_images.push(image);
                first_error.get_or_insert_with(|| e.to_string());
            }
        }

        match first_error {
            None => {
                state.record_processed(position)?;
                outcomes.push(CommitOutcome::Processed {
                    position,
                    watermarked: diff.added,
                    removed: diff.removed,
                });
            }
            Some(error) => outcomes.push(CommitOutcome::Failed {
                position,
                failed_images,
                error,
            }),
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    tracing::info!(
        collection = %state.collection,
        start,
        end,
        failed,
        "Page committed"
    );
    Ok(outcomes)
}

/// Preview entries for the annotated positions in `range`
pub fn build_preview(
    state: &RegistrationState,
    range: RangeInclusive<usize>,
    titles: &TitleCatalog,
) -> Vec<PreviewEntry> {
    range
        .filter_map(|position| {
            let slot = state.slots.get(position)?;
            let annotation = slot.annotation.as_ref()?;
            let served = |idx: usize| {
                slot.product
                    .output_image(idx)
                    .map(|p| format!("{WATERMARKED_PREFIX}/{p}"))
            };
            Some(PreviewEntry {
                position,
                label: label_for(annotation, titles),
                title: title_text(annotation, titles),
                color: annotation.color.clone().unwrap_or_default(),
                primary: annotation.primary_image().and_then(served),
                gallery: annotation.gallery.iter().filter_map(|&i| served(i)).collect(),
            })
        })
        .collect()
}
