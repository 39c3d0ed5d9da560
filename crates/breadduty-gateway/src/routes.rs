//! API route handlers for the gateway.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use breadduty_core::types::{DutyDate, DutyDays, User};
use breadduty_core::{Error, message, roster};
use breadduty_scheduler::dispatch;
use breadduty_store::UserPatch;

use super::server::AppState;

/// Error wrapper mapping core error kinds to HTTP status codes.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Persistence(_) | Error::Config(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({
            "ok": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "breadduty-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

// ── Users ──────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub duty_days: DutyDays,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub duty_days: Option<DutyDays>,
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users()?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .store
        .create_user(&req.name, &req.email, req.duty_days)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.get_user(id)?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let patch = UserPatch {
        name: req.name,
        email: req.email,
        duty_days: req.duty_days,
    };
    Ok(Json(state.store.update_user(id, patch)?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let dates_removed = state.store.delete_user(id)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "dates_removed": dates_removed,
    })))
}

/// The duty-day options, for admin UIs.
pub async fn list_duty_days() -> Json<Vec<&'static str>> {
    Json(DutyDays::all().iter().map(|d| d.as_str()).collect())
}

// ── Duty dates ──────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateDateRequest {
    pub date: NaiveDate,
    pub user_id: i64,
}

pub async fn list_dates(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DutyDate>>> {
    Ok(Json(state.store.list_dates()?))
}

pub async fn create_date(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDateRequest>,
) -> ApiResult<(StatusCode, Json<DutyDate>)> {
    let date = state.store.create_date(req.date, req.user_id)?;
    Ok((StatusCode::CREATED, Json(date)))
}

pub async fn get_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DutyDate>> {
    Ok(Json(state.store.get_date(id)?))
}

pub async fn delete_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    state.store.delete_date(id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn delete_all_dates(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = state.store.delete_all_dates()?;
    Ok(Json(serde_json::json!({ "ok": true, "deleted": deleted })))
}

pub async fn mark_date_notified(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    state.store.mark_notified(id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Replace the roster from today through the end of the year with a
/// balanced plan over the current directory.
pub async fn generate_roster(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let today = Local::now().date_naive();
    let end = NaiveDate::from_ymd_opt(today.year(), 12, 31)
        .ok_or_else(|| Error::Validation("invalid year end".into()))?;

    let users = state.store.list_users()?;
    let plan = roster::plan(&users, today, end);
    let created = state.store.replace_roster(today, end, &plan)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "created": created,
            "start": today,
            "end": end,
        })),
    ))
}

// ── Mail ──────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SendRemindersRequest {
    pub days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Manual reminder pass. Wider default window (7 days) than the daily job.
pub async fn send_reminders(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SendRemindersRequest>>,
) -> ApiResult<Json<serde_json::Value>> {
    let days = body.and_then(|Json(r)| r.days).unwrap_or(7);
    let today = Local::now().date_naive();
    let run = dispatch::send_due_reminders(&state.store, &state.outbox, today, days)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "due": run.due,
        "queued": run.sent,
        "skipped": run.skipped,
    })))
}

/// Day-of broadcast with optional custom subject/message.
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    body: Option<Json<BroadcastRequest>>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let today = Local::now().date_naive();
    let summary = dispatch::broadcast_today(
        &state.store,
        &state.outbox,
        today,
        req.subject.as_deref(),
        req.message.as_deref(),
    )?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "sent": summary.sent,
        "skipped": summary.skipped,
        "default_subject": message::BROADCAST_SUBJECT,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError(Error::Validation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(Error::Conflict("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(Error::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(Error::Persistence("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
