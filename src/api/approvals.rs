//! Approval decision endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{approval::DecisionRequest, Approval},
};

use super::{AuthenticatedUser, OptionalJson};

/// Approvals waiting on a decision
#[utoipa::path(
    get,
    path = "/approvals/pending",
    tag = "approvals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending approvals", body = Vec<Approval>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_pending_approvals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Approval>>> {
    claims.require_admin()?;

    let approvals = state.services.rentals.pending_approvals().await?;
    Ok(Json(approvals))
}

/// Approvals of one rental
#[utoipa::path(
    get,
    path = "/approvals/rental/{rental_id}",
    tag = "approvals",
    security(("bearer_auth" = [])),
    params(
        ("rental_id" = Uuid, Path, description = "Rental ID")
    ),
    responses(
        (status = 200, description = "Approvals of the rental", body = Vec<Approval>),
        (status = 404, description = "Rental not found")
    )
)]
pub async fn list_rental_approvals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(rental_id): Path<Uuid>,
) -> AppResult<Json<Vec<Approval>>> {
    let approvals = state.services.rentals.approvals_for_rental(rental_id).await?;
    Ok(Json(approvals))
}

/// Approve a rental gate
#[utoipa::path(
    post,
    path = "/approvals/{id}/approve",
    tag = "approvals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Approval ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Approval recorded", body = Approval),
        (status = 400, description = "Malformed decision body", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Approval not found"),
        (status = 422, description = "Already decided", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> AppResult<Json<Approval>> {
    claims.require_admin()?;
    let request = request.unwrap_or_default();
    request.validate()?;

    let approval = state
        .services
        .rentals
        .approve(id, &claims.sub, request.note)
        .await?;
    Ok(Json(approval))
}

/// Reject a rental
#[utoipa::path(
    post,
    path = "/approvals/{id}/reject",
    tag = "approvals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Approval ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Rejection recorded", body = Approval),
        (status = 400, description = "Malformed decision body", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Approval not found"),
        (status = 422, description = "Already decided", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> AppResult<Json<Approval>> {
    claims.require_admin()?;
    let request = request.unwrap_or_default();
    request.validate()?;

    let approval = state
        .services
        .rentals
        .reject(id, &claims.sub, request.note)
        .await?;
    Ok(Json(approval))
}
