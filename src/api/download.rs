//! Export download endpoint

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use super::ErrorResponse;
use crate::export::{self, ExportFormat};
use crate::stats::{filter_by_date, DateRange};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    format: Option<String>,
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
}

/// GET /api/download - the record set as a CSV or JSON attachment, with the
/// current date embedded in the suggested filename.
pub async fn download_records(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())
        .map_err(|message| (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })))?;

    let records = state.store.read_all().await.map_err(|e| {
        error!("Failed to read response store: {}", e);
        download_failure()
    })?;
    let records = filter_by_date(records, &range);

    let format = ExportFormat::parse(query.format.as_deref());
    let body = export::render(&records, &state.schema, format).map_err(|e| {
        error!("Failed to render export: {}", e);
        download_failure()
    })?;

    let filename = format!(
        "survey-data-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

fn download_failure() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: "download unavailable".to_string(),
        }),
    )
}
