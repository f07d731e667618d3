//! Processing report model
//!
//! Field names follow the report document consumed by the operators
//! (`numero`, `titulo`, `url`, `fecha`, `estado`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "exitoso")]
    Success,
    #[serde(rename = "error")]
    Error,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Success => "exitoso",
            ReportStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One processed product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub numero: u64,
    pub titulo: String,
    /// Storefront permalink, or the error message when `estado` is error
    pub url: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub fecha: String,
    pub estado: ReportStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub exitosos: usize,
    pub errores: usize,
    pub ultimo_procesado: Option<String>,
}

impl ReportSummary {
    pub fn from_entries(entries: &[ReportEntry]) -> Self {
        let exitosos = entries
            .iter()
            .filter(|e| e.estado == ReportStatus::Success)
            .count();
        Self {
            total: entries.len(),
            exitosos,
            errores: entries.len() - exitosos,
            ultimo_procesado: entries.last().map(|e| e.fecha.clone()),
        }
    }
}

/// Report document as written to the backup file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportDocument {
    pub productos: Vec<ReportEntry>,
}
