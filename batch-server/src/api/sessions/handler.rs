//! Registration session API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{CommitOutcome, PreviewResponse, ProcessResponse, ReportStatus};
use shared::AppError;

use super::view::{CommandResponse, SessionView};
use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::publish::PublishRequest;
use crate::registration::{
    CommitContext, IncompleteEntry, RegistrationCommand, RegistrationError, RegistrationState,
    build_preview, commit_page,
};

#[derive(Debug, Deserialize)]
pub struct OpenCollectionRequest {
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

fn current_bounds(state: &RegistrationState) -> Result<std::ops::RangeInclusive<usize>, AppError> {
    state.page_bounds(state.current_page).ok_or_else(|| {
        RegistrationError::PageOutOfRange {
            page: state.current_page,
            total: state.total_pages(),
        }
        .into()
    })
}

/// POST /api/sessions/{id}/collection - 打开或切换系列
pub async fn open_collection(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OpenCollectionRequest>,
) -> ApiResult<SessionView> {
    let collection = payload.collection.trim();
    if collection.is_empty() {
        return Err(AppError::validation("collection is required").with_detail("field", "collection"));
    }
    let catalog = state.catalog.clone();
    let session = state
        .sessions
        .open_collection(&id, collection, || Ok(catalog.products(collection)?))
        .await?;
    ok(SessionView::build(&session, None))
}

/// GET /api/sessions/{id}?page= - 批次视图
pub async fn get_session(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<SessionView> {
    let session = state.sessions.snapshot(&id).await?;
    ok(SessionView::build(&session, query.page))
}

/// POST /api/sessions/{id}/commands - 执行登记命令
pub async fn apply_command(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(command): Json<RegistrationCommand>,
) -> ApiResult<CommandResponse> {
    let (affected, session) = state.sessions.apply(&id, command).await?;
    // A duplicate may land on the next page; show the page it landed on
    let page = affected.map(|pos| pos / session.page_size);
    ok(CommandResponse {
        affected,
        session: SessionView::build(&session, page),
    })
}

/// GET /api/sessions/{id}/incomplete?page= - 缺失字段
pub async fn incomplete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<IncompleteEntry>> {
    let session = state.sessions.snapshot(&id).await?;
    let page = query.page.unwrap_or(session.current_page);
    let bounds = session
        .page_bounds(page)
        .ok_or(RegistrationError::PageOutOfRange {
            page,
            total: session.total_pages(),
        })?;
    ok(session.compute_incomplete(*bounds.start(), *bounds.end()))
}

/// POST /api/sessions/{id}/preview - 提交当前批次 (水印) 并返回预览
pub async fn preview(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<PreviewResponse> {
    let mut session = state.sessions.lock_for_commit(&id)?;
    let bounds = current_bounds(&session)?;

    let ctx = CommitContext {
        watermarker: state.watermarker.as_ref(),
        titles: &state.titles,
        source_root: &state.config.download_root,
        output_root: &state.config.watermark_root,
    };
    let outcomes = commit_page(&mut session, *bounds.start(), *bounds.end(), &ctx).await?;
    state.sessions.persist(&id, &session)?;

    let count = |pred: fn(&CommitOutcome) -> bool| outcomes.iter().filter(|o| pred(o)).count();
    let succeeded = count(|o| matches!(o, CommitOutcome::Processed { .. }));
    let already_processed = count(|o| matches!(o, CommitOutcome::AlreadyProcessed { .. }));
    let failed = count(CommitOutcome::is_failure);

    tracing::info!(
        session = %id,
        page = session.current_page,
        succeeded,
        already_processed,
        failed,
        "Batch previewed"
    );

    ok(PreviewResponse {
        page: session.current_page,
        entries: build_preview(&session, bounds, &state.titles),
        outcomes,
        succeeded,
        already_processed,
        failed,
    })
}

/// POST /api/sessions/{id}/process - 确认批次：发布、写报告、进入下一批
pub async fn process(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<ProcessResponse> {
    let mut session = state.sessions.lock_for_commit(&id)?;
    let bounds = current_bounds(&session)?;

    let incomplete = session.compute_incomplete(*bounds.start(), *bounds.end());
    if !incomplete.is_empty() {
        return Err(RegistrationError::Incomplete(incomplete).into());
    }
    let pending: Vec<usize> = bounds
        .clone()
        .filter(|&pos| !session.slots[pos].diff().is_empty())
        .collect();
    if !pending.is_empty() {
        return Err(RegistrationError::NotPreviewed(pending).into());
    }

    let page = session.current_page;
    let (published, entries): (Vec<_>, Vec<_>) = build_preview(&session, bounds, &state.titles)
        .into_iter()
        .partition(|entry| session.slots[entry.position].is_published());
    if entries.is_empty() {
        return Err(RegistrationError::AlreadyPublished { page }.into());
    }
    let mut succeeded = 0;
    let mut failed = 0;

    for entry in &entries {
        let product = &session.slots[entry.position].product;
        let result = match &state.publisher {
            Some(publisher) => {
                let annotation = session.slots[entry.position].annotation.clone().unwrap_or_default();
                let output = |idx: usize| {
                    product
                        .output_image(idx)
                        .map(|p| state.config.watermark_root.join(p))
                };
                match annotation.primary_image().and_then(output) {
                    Some(primary) => {
                        let request = PublishRequest {
                            name: entry.label.clone(),
                            primary,
                            gallery: annotation.gallery.iter().filter_map(|&i| output(i)).collect(),
                        };
                        publisher.publish(&request).await.map_err(|e| e.to_string())
                    }
                    None => Err("no primary image".to_string()),
                }
            }
            None => Ok(entry.primary.clone().unwrap_or_default()),
        };

        match result {
            Ok(url) => {
                state.report.add(&entry.label, &url, ReportStatus::Success)?;
                session.mark_published(entry.position)?;
                succeeded += 1;
            }
            Err(error) => {
                tracing::warn!(session = %id, position = entry.position, error = %error, "Publishing failed");
                state.report.add(&entry.label, &error, ReportStatus::Error)?;
                failed += 1;
            }
        }
    }

    let next_page = session.advance_page();
    state.sessions.persist(&id, &session)?;

    tracing::info!(
        session = %id,
        page,
        processed = entries.len(),
        skipped = published.len(),
        succeeded,
        failed,
        next_page,
        "Batch processed"
    );
    ok(ProcessResponse {
        processed: entries.len(),
        succeeded,
        failed,
        already_published: published.len(),
        next_page,
        total_pages: session.total_pages(),
    })
}
