use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use super::decision::Verdict;
use super::domain::{RawInput, RecordId};
use super::gate::{PipelineError, Submission};
use super::legacy::LegacyRecord;
use super::registry::RegistryError;
use super::service::{RecordService, RecordServiceError};
use super::store::{RecordStore, StoreError};
use super::structure::parse_shape;

/// Router exposing validation, lookup, and registry introspection.
pub fn gate_router<S>(service: Arc<RecordService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route("/api/v1/categories", get(categories_handler::<S>))
        .route("/api/v1/records", get(list_handler::<S>))
        .route("/api/v1/records/validate", post(validate_handler::<S>))
        .route("/api/v1/records/legacy", post(legacy_handler::<S>))
        .route("/api/v1/records/:record_id", get(record_handler::<S>))
        .with_state(service)
}

type JsonBody = Result<axum::Json<Value>, JsonRejection>;

/// Bodies are read as plain JSON first so a wrong record shape is reported
/// as a structural failure instead of an extractor rejection.
fn shaped_body<T: DeserializeOwned>(body: JsonBody) -> Result<T, Response> {
    let axum::Json(value) = body.map_err(|rejection| {
        let payload = json!({
            "error": rejection.body_text(),
            "kind": "REQUEST_ERROR",
        });
        (rejection.status(), axum::Json(payload)).into_response()
    })?;
    parse_shape(value)
        .map_err(|err| error_response(&RecordServiceError::Pipeline(PipelineError::from(err))))
}

pub(crate) async fn validate_handler<S>(
    State(service): State<Arc<RecordService<S>>>,
    body: JsonBody,
) -> Response
where
    S: RecordStore + 'static,
{
    let raw: RawInput = match shaped_body(body) {
        Ok(raw) => raw,
        Err(response) => return response,
    };
    match service.submit(&raw) {
        Ok(submission) => {
            let status = match &submission {
                Submission::Fallback(_) => StatusCode::CREATED,
                Submission::Evaluated(outcome) => match outcome.verdict() {
                    Verdict::Write => StatusCode::CREATED,
                    Verdict::Repair => StatusCode::ACCEPTED,
                    Verdict::Reject => StatusCode::UNPROCESSABLE_ENTITY,
                },
            };
            (status, axum::Json(submission)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn legacy_handler<S>(
    State(service): State<Arc<RecordService<S>>>,
    body: JsonBody,
) -> Response
where
    S: RecordStore + 'static,
{
    let legacy: LegacyRecord = match shaped_body(body) {
        Ok(legacy) => legacy,
        Err(response) => return response,
    };
    match service.submit_legacy(&legacy) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn record_handler<S>(
    State(service): State<Arc<RecordService<S>>>,
    Path(record_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    let id = RecordId(record_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(RecordServiceError::Store(StoreError::NotFound)) => {
            let payload = json!({
                "recordId": id.0,
                "error": "record not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<RecordService<S>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.list(params.limit) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn categories_handler<S>(State(service): State<Arc<RecordService<S>>>) -> Response
where
    S: RecordStore + 'static,
{
    let summaries = service.gate().registry().summaries();
    (StatusCode::OK, axum::Json(summaries)).into_response()
}

fn error_response(error: &RecordServiceError) -> Response {
    let status = match error {
        RecordServiceError::Pipeline(PipelineError::Structural(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RecordServiceError::Pipeline(PipelineError::Config(RegistryError::UnknownCategory(_))) => {
            StatusCode::NOT_FOUND
        }
        RecordServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        RecordServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        RecordServiceError::Pipeline(PipelineError::Config(_))
        | RecordServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let kind = match error {
        RecordServiceError::Pipeline(err) => err.kind(),
        RecordServiceError::Store(_) => "STORE_ERROR",
    };

    let payload = json!({
        "error": error.to_string(),
        "kind": kind,
    });
    (status, axum::Json(payload)).into_response()
}
