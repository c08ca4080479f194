use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use super::store::GradingStore;
use crate::models::{GradeLedger, Submission, SubmissionKey};

type ApiResult<T> = Result<T, (StatusCode, String)>;

fn submission_key((lecture_id, assignment_id, submission_id): (u64, u64, u64)) -> SubmissionKey {
    SubmissionKey::new(lecture_id, assignment_id, submission_id)
}

fn not_found(key: &SubmissionKey) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("Submission {} not found", key),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Properties
// ============================================================

pub async fn get_properties(
    State(store): State<GradingStore>,
    Path(ids): Path<(u64, u64, u64)>,
) -> ApiResult<Json<Value>> {
    let key = submission_key(ids);
    store
        .get(&key)
        .map(|entry| Json(entry.properties))
        .ok_or_else(|| not_found(&key))
}

pub async fn update_properties(
    State(store): State<GradingStore>,
    Path(ids): Path<(u64, u64, u64)>,
    Json(properties): Json<Value>,
) -> ApiResult<StatusCode> {
    let key = submission_key(ids);

    if let Err(e) = GradeLedger::from_value(properties.clone()) {
        tracing::warn!("Rejected properties for submission {}: {}", key, e);
        return Err((StatusCode::BAD_REQUEST, format!("Invalid properties: {}", e)));
    }

    if store.set_properties(&key, properties) {
        tracing::info!("Properties of submission {} updated", key);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&key))
    }
}

// ============================================================
// Submissions
// ============================================================

pub async fn get_submission(
    State(store): State<GradingStore>,
    Path(ids): Path<(u64, u64, u64)>,
) -> ApiResult<Json<Submission>> {
    let key = submission_key(ids);
    store
        .get(&key)
        .map(|entry| Json(entry.submission))
        .ok_or_else(|| not_found(&key))
}

pub async fn update_submission(
    State(store): State<GradingStore>,
    Path(ids): Path<(u64, u64, u64)>,
    Json(submission): Json<Submission>,
) -> ApiResult<Json<Submission>> {
    let key = submission_key(ids);

    if submission.id != key.submission_id {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Submission id {} does not match path id {}",
                submission.id, key.submission_id
            ),
        ));
    }

    if store.set_submission(&key, submission.clone()) {
        tracing::info!(
            "Submission {} manual status set to {}",
            key,
            submission.manual_status.as_str()
        );
        Ok(Json(submission))
    } else {
        Err(not_found(&key))
    }
}
