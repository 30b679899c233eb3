//! Operator triggers for backfills and trending recompute.

use actix_web::{HttpResponse, post, web};
use serde_json::json;
use tracing::error;

use crate::domain::{
    ApiResult, BackfillError, BackfillReport, Error, RecordKind, TrendingError, TrendingReport,
};
use crate::inbound::http::state::HttpState;

fn map_backfill_error(err: BackfillError) -> Error {
    match err {
        BackfillError::AlreadyRunning { kind } => {
            Error::conflict(format!("{kind} backfill is already running"))
                .with_details(json!({ "kind": kind.as_str() }))
        }
        other @ BackfillError::Fetch { .. } => {
            error!(error = %other, "backfill aborted");
            Error::internal(other.to_string())
        }
    }
}

fn map_trending_error(err: TrendingError) -> Error {
    match err {
        TrendingError::AlreadyRunning => Error::conflict("trending recompute is already running"),
        other @ TrendingError::Listing { .. } => {
            error!(error = %other, "trending recompute aborted");
            Error::internal(other.to_string())
        }
    }
}

/// Run one backfill for `kind` to completion.
#[utoipa::path(
    post,
    path = "/admin/backfill/{kind}",
    params(("kind" = RecordKind, Path, description = "`venues` or `events`")),
    responses(
        (status = 200, description = "Run report", body = BackfillReport),
        (status = 400, description = "Unknown record kind", body = Error),
        (status = 409, description = "A run for this kind is in progress", body = Error),
        (status = 500, description = "Run aborted", body = Error)
    ),
    tags = ["admin"],
    operation_id = "runBackfill"
)]
#[post("/admin/backfill/{kind}")]
pub async fn run_backfill(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let raw = path.into_inner();
    let kind: RecordKind = raw.parse().map_err(|err| {
        Error::invalid_request(format!("{err}"))
            .with_details(json!({ "field": "kind", "value": raw }))
    })?;
    let report = state
        .backfill_for(kind)
        .run()
        .await
        .map_err(map_backfill_error)?;
    Ok(HttpResponse::Ok().json(report))
}

/// Recompute trending scores now.
#[utoipa::path(
    post,
    path = "/admin/trending/run",
    responses(
        (status = 200, description = "Run report", body = TrendingReport),
        (status = 409, description = "A recompute is in progress", body = Error),
        (status = 500, description = "Run aborted", body = Error)
    ),
    tags = ["admin"],
    operation_id = "runTrending"
)]
#[post("/admin/trending/run")]
pub async fn run_trending(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let report = state.trending.run_once().await.map_err(map_trending_error)?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::RemoteCallError;
    use rstest::rstest;

    #[rstest]
    fn overlapping_backfills_are_conflicts() {
        let err = map_backfill_error(BackfillError::AlreadyRunning {
            kind: RecordKind::Events,
        });
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.details(), Some(&json!({ "kind": "events" })));
    }

    #[rstest]
    fn fetch_failures_are_internal_errors() {
        let err = map_backfill_error(BackfillError::Fetch {
            kind: RecordKind::Venues,
            offset: 200,
            source: RemoteCallError::timeout("deadline"),
        });
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.message().contains("offset 200"));
    }

    #[rstest]
    fn overlapping_trending_runs_are_conflicts() {
        assert_eq!(
            map_trending_error(TrendingError::AlreadyRunning).code(),
            ErrorCode::Conflict
        );
    }
}
