//! Statement upload handlers
//!
//! Each endpoint accepts a multipart form with a single `file` field. The
//! file is decoded up front; format problems are a 400 before any row is
//! stored, while per-row problems are reported in the summary.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use harcama_core::import::{
    read_csv, read_pdf_text, read_spreadsheet, FileKind, StatementCandidate,
};
use harcama_core::ImportSummary;

/// Maximum statement lines echoed back in a PDF upload response
const SAMPLE_EXTRACTIONS: usize = 5;

/// Response for CSV and spreadsheet uploads
#[derive(Serialize)]
pub struct TableUploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

/// Response for PDF uploads
#[derive(Serialize)]
pub struct PdfUploadResponse {
    pub message: String,
    pub lines_scanned: usize,
    pub detected: usize,
    pub auto_added: usize,
    pub not_added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub sample_extractions: Vec<StatementCandidate>,
}

/// An uploaded file
struct Upload {
    filename: String,
    data: Vec<u8>,
}

/// Pull the `file` field out of a multipart form
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut upload: Option<Upload> = None;
    let mut total_size: usize = 0;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;
        total_size += bytes.len();

        // Check file size limit
        if total_size > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        upload = Some(Upload {
            filename,
            data: bytes.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    if upload.data.is_empty() {
        return Err(AppError::bad_request("Uploaded file is empty"));
    }
    Ok(upload)
}

/// Reject files whose extension does not belong to the endpoint
fn require_kind(upload: &Upload, expected: FileKind, accepted: &str) -> Result<(), AppError> {
    if FileKind::from_filename(&upload.filename) == Some(expected) {
        Ok(())
    } else {
        Err(AppError::bad_request(&format!(
            "Only {} files are accepted, got '{}'",
            accepted, upload.filename
        )))
    }
}

fn table_response(summary: ImportSummary) -> Json<TableUploadResponse> {
    let message = format!(
        "Imported {} of {} rows",
        summary.imported, summary.total_rows
    );
    Json(TableUploadResponse { message, summary })
}

/// POST /api/upload/csv - Import a CSV statement export
pub async fn upload_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TableUploadResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    require_kind(&upload, FileKind::Csv, "CSV")?;

    let table = read_csv(&upload.data).map_err(AppError::from_core)?;
    let summary = state
        .pipeline
        .import_table(&table, &state.db)
        .map_err(AppError::from_core)?;

    info!(
        file = %upload.filename,
        imported = summary.imported,
        total_rows = summary.total_rows,
        "CSV upload processed"
    );
    Ok(table_response(summary))
}

/// POST /api/upload/excel - Import a spreadsheet statement export
pub async fn upload_excel(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TableUploadResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    require_kind(&upload, FileKind::Spreadsheet, "Excel")?;

    let table = read_spreadsheet(&upload.data).map_err(AppError::from_core)?;
    let summary = state
        .pipeline
        .import_table(&table, &state.db)
        .map_err(AppError::from_core)?;

    info!(
        file = %upload.filename,
        imported = summary.imported,
        total_rows = summary.total_rows,
        "Spreadsheet upload processed"
    );
    Ok(table_response(summary))
}

/// POST /api/upload/pdf - Extract and import transaction lines from a PDF statement
pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PdfUploadResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    require_kind(&upload, FileKind::Pdf, "PDF")?;

    let text = read_pdf_text(&upload.data).map_err(AppError::from_core)?;
    let summary = state
        .pipeline
        .import_statement(&text, &state.db)
        .map_err(AppError::from_core)?;

    info!(
        file = %upload.filename,
        detected = summary.detected,
        auto_added = summary.auto_added,
        "PDF upload processed"
    );

    let message = format!(
        "Detected {} transactions, added {}",
        summary.detected, summary.auto_added
    );
    let mut samples = summary.samples;
    samples.truncate(SAMPLE_EXTRACTIONS);

    Ok(Json(PdfUploadResponse {
        message,
        lines_scanned: summary.lines_scanned,
        detected: summary.detected,
        auto_added: summary.auto_added,
        not_added: summary.not_added,
        skipped: summary.skipped,
        errors: summary.errors,
        warnings: summary.warnings,
        sample_extractions: samples,
    }))
}
