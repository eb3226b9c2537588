use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::models::candidate::ReportType;
use crate::services::export_service::ExportService;
use crate::{
    error::{Error, Result},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "analystEmail")]
    pub analyst_email: Option<String>,
}

/// Export a report as XLSX
pub async fn export_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let report: ReportType = report_type.parse().map_err(Error::BadRequest)?;
    let analyst = query
        .analyst_email
        .filter(|a| !a.trim().is_empty() && a != "todos");

    let rows = state.report_service.report(report, analyst.as_deref()).await?;
    let buffer = ExportService::generate_report_xlsx(report, &rows)?;

    let filename = format!(
        "relatorio_{}_{}.xlsx",
        report,
        chrono::Utc::now().format("%Y-%m-%d")
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
