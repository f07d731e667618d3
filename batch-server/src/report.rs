//! 处理报告
//!
//! Entries live in redb; clearing writes a JSON backup next to the work
//! directory first.

use shared::models::{ReportDocument, ReportEntry, ReportStatus, ReportSummary};
use shared::util::{file_timestamp, report_timestamp};
use shared::{AppError, AppResult};
use std::path::PathBuf;

use crate::storage::Storage;

const CSV_HEADER: [&str; 5] = ["Numero", "Titulo", "URL", "Fecha", "Estado"];

#[derive(Clone)]
pub struct ReportService {
    storage: Storage,
    backup_dir: PathBuf,
}

/// Result of clearing the report
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClearedReport {
    pub removed: u64,
    pub backup: Option<String>,
}

impl ReportService {
    pub fn new(storage: Storage, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            backup_dir: backup_dir.into(),
        }
    }

    pub fn add(&self, titulo: &str, url: &str, estado: ReportStatus) -> AppResult<ReportEntry> {
        let entry = self
            .storage
            .append_report(titulo, url, &report_timestamp(), estado)?;
        tracing::info!(numero = entry.numero, titulo = %entry.titulo, estado = %entry.estado, "Report entry added");
        Ok(entry)
    }

    pub fn entries(&self) -> AppResult<Vec<ReportEntry>> {
        Ok(self.storage.report_entries()?)
    }

    pub fn summary(&self) -> AppResult<ReportSummary> {
        Ok(ReportSummary::from_entries(&self.entries()?))
    }

    /// CSV export, `Numero,Titulo,URL,Fecha,Estado`
    pub fn export_csv(&self) -> AppResult<Vec<u8>> {
        let entries = self.entries()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| AppError::internal(format!("CSV export failed: {e}"));

        writer.write_record(CSV_HEADER).map_err(csv_err)?;
        for e in &entries {
            writer
                .write_record([
                    e.numero.to_string().as_str(),
                    e.titulo.as_str(),
                    e.url.as_str(),
                    e.fecha.as_str(),
                    e.estado.as_str(),
                ])
                .map_err(csv_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::internal(format!("CSV export failed: {e}")))
    }

    /// Back up to `report_backup_<ts>.json`, then empty the report
    pub fn clear(&self) -> AppResult<ClearedReport> {
        let entries = self.entries()?;
        let backup = if entries.is_empty() {
            None
        } else {
            std::fs::create_dir_all(&self.backup_dir)
                .map_err(|e| AppError::filesystem(e.to_string()))?;
            let path = self
                .backup_dir
                .join(format!("report_backup_{}.json", file_timestamp()));
            let document = ReportDocument { productos: entries };
            let json = serde_json::to_vec_pretty(&document)
                .map_err(|e| AppError::internal(e.to_string()))?;
            std::fs::write(&path, json).map_err(|e| AppError::filesystem(e.to_string()))?;
            tracing::info!(path = %path.display(), "Report backed up");
            Some(path.display().to_string())
        };

        let removed = self.storage.clear_report()?;
        tracing::info!(removed, "Report cleared");
        Ok(ClearedReport { removed, backup })
    }
}
