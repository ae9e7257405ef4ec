//! Email administration endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        email::{
            EmailConfigView, EmailLog, EmailTemplate, PreviewRequest, SendRemindersRequest,
            SendRemindersResponse,
        },
        rental::{OverdueCandidate, ReminderCandidate},
    },
};

use super::{AuthenticatedUser, OptionalJson};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// Day to read (YYYY-MM-DD, default today)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemindersQuery {
    /// Window in days, today included (default from configuration)
    pub days: Option<i64>,
}

/// Delivery log of one day
#[utoipa::path(
    get,
    path = "/emails/logs",
    tag = "emails",
    security(("bearer_auth" = [])),
    params(LogsQuery),
    responses(
        (status = 200, description = "Logged delivery attempts", body = Vec<EmailLog>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LogsQuery>,
) -> AppResult<Json<Vec<EmailLog>>> {
    claims.require_admin()?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let logs = state.services.email.logs(date).await?;
    Ok(Json(logs))
}

/// Effective SMTP settings
#[utoipa::path(
    get,
    path = "/emails/config",
    tag = "emails",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "SMTP settings without secrets", body = EmailConfigView),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_config(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<EmailConfigView>> {
    claims.require_admin()?;
    Ok(Json(state.services.email.config_view()))
}

/// Active rentals due soon
#[utoipa::path(
    get,
    path = "/emails/return-reminders",
    tag = "emails",
    security(("bearer_auth" = [])),
    params(RemindersQuery),
    responses(
        (status = 200, description = "Reminder candidates", body = Vec<ReminderCandidate>),
        (status = 400, description = "Negative window", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_return_reminders(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RemindersQuery>,
) -> AppResult<Json<Vec<ReminderCandidate>>> {
    claims.require_admin()?;

    let scanner = &state.services.scanner;
    let days = query.days.unwrap_or_else(|| scanner.default_reminder_days());
    let candidates = scanner
        .reminder_candidates(Utc::now().date_naive(), days)
        .await?;
    Ok(Json(candidates))
}

/// Active rentals past their expected return date
#[utoipa::path(
    get,
    path = "/emails/overdue-rentals",
    tag = "emails",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue candidates", body = Vec<OverdueCandidate>)
    )
)]
pub async fn list_overdue_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<OverdueCandidate>>> {
    claims.require_admin()?;

    let candidates = state
        .services
        .scanner
        .overdue_candidates(Utc::now().date_naive())
        .await?;
    Ok(Json(candidates))
}

/// Render a template with sample values
#[utoipa::path(
    post,
    path = "/emails/preview",
    tag = "emails",
    security(("bearer_auth" = [])),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Rendered email", body = EmailTemplate)
    )
)]
pub async fn preview(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<PreviewRequest>,
) -> AppResult<Json<EmailTemplate>> {
    claims.require_admin()?;

    let notification = request.into_notification(Utc::now().date_naive());
    Ok(Json(state.services.email.render(&notification)))
}

/// Send return reminders for the selected rentals
#[utoipa::path(
    post,
    path = "/emails/send-return-reminders",
    tag = "emails",
    security(("bearer_auth" = [])),
    request_body = SendRemindersRequest,
    responses(
        (status = 200, description = "Per-rental delivery results", body = SendRemindersResponse),
        (status = 400, description = "No rental selected", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_return_reminders(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SendRemindersRequest>,
) -> AppResult<Json<SendRemindersResponse>> {
    claims.require_admin()?;

    if request.rental_ids.is_empty() {
        return Err(crate::error::AppError::BadRequest(
            "Select at least one rental".to_string(),
        ));
    }

    let response = state
        .services
        .scanner
        .send_return_reminders(&request.rental_ids, Utc::now().date_naive())
        .await;
    Ok(Json(response))
}

/// Send overdue notices; without a body every overdue rental is notified
#[utoipa::path(
    post,
    path = "/emails/send-overdue-reminders",
    tag = "emails",
    security(("bearer_auth" = [])),
    request_body(content = SendRemindersRequest, description = "Optional selection of rentals"),
    responses(
        (status = 200, description = "Per-rental delivery results", body = SendRemindersResponse),
        (status = 400, description = "Malformed selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_overdue_reminders(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    OptionalJson(request): OptionalJson<SendRemindersRequest>,
) -> AppResult<Json<SendRemindersResponse>> {
    claims.require_admin()?;

    let selection = request
        .map(|r| r.rental_ids)
        .filter(|ids| !ids.is_empty());
    let response = state
        .services
        .scanner
        .send_overdue_reminders(selection.as_deref(), Utc::now().date_naive())
        .await?;
    Ok(Json(response))
}
