//! Statistics endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::ErrorResponse;
use crate::stats::{aggregate, filter_by_date, DateRange, StatsReport};
use crate::AppState;

/// Most recent submissions included in a stats response.
const SUBMISSION_LIST_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    report: StatsReport,
    submissions: Vec<SubmissionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionSummary {
    #[serde(rename = "submittedAt")]
    submitted_at: DateTime<Utc>,
    ip: String,
}

/// GET /api/stats - aggregated statistics plus the most recent submissions.
///
/// Unfiltered queries are served from the warm cache; date-filtered queries
/// always recompute over the filtered subset.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())
        .map_err(|message| (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })))?;

    let records = state.store.read_all().await.map_err(|e| {
        error!("Failed to read response store: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: "statistics unavailable".to_string(),
            }),
        )
    })?;
    let records = filter_by_date(records, &range);

    let report = if range.is_unbounded() {
        match state.cache.get() {
            Some(report) => report,
            None => {
                // Cache not warmed yet; compute now and keep the result.
                let report = aggregate(&records, &state.schema);
                state.cache.replace(report.clone());
                report
            }
        }
    } else {
        aggregate(&records, &state.schema)
    };

    let submissions = records
        .iter()
        .rev()
        .take(SUBMISSION_LIST_LIMIT)
        .map(|r| SubmissionSummary {
            submitted_at: r.submitted_at,
            ip: r.origin().to_string(),
        })
        .collect();

    Ok(Json(StatsResponse {
        report,
        submissions,
    }))
}
