//! Report API Handlers

use axum::extract::State;
use axum::response::IntoResponse;
use http::header;
use shared::AppResult;
use shared::models::{ReportEntry, ReportSummary};
use shared::util::file_timestamp;

use crate::api::{ApiResult, ok};
use crate::core::ServerState;
use crate::report::ClearedReport;

/// GET /api/report - 报告条目
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<ReportEntry>> {
    ok(state.report.entries()?)
}

/// GET /api/report/summary - 统计
pub async fn summary(State(state): State<ServerState>) -> ApiResult<ReportSummary> {
    ok(state.report.summary()?)
}

/// GET /api/report/export - 导出 CSV
pub async fn export(State(state): State<ServerState>) -> AppResult<impl IntoResponse> {
    let body = state.report.export_csv()?;
    let disposition = format!("attachment; filename=\"reporte_{}.csv\"", file_timestamp());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// DELETE /api/report - 清空 (先备份)
pub async fn clear(State(state): State<ServerState>) -> ApiResult<ClearedReport> {
    ok(state.report.clear()?)
}
