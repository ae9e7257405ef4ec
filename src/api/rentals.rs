//! Rental workflow endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        rental::{CreateRental, UpdateRental},
        RentalDetails,
    },
};

use super::AuthenticatedUser;

/// List every rental
#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All rentals with item, requester and approvals", body = Vec<RentalDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state.services.rentals.list().await?;
    Ok(Json(rentals))
}

/// Get one rental
#[utoipa::path(
    get,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Rental ID")
    ),
    responses(
        (status = 200, description = "Rental details", body = RentalDetails),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentalDetails>> {
    let rental = state.services.rentals.get(id).await?;
    Ok(Json(rental))
}

/// Rentals of one user
#[utoipa::path(
    get,
    path = "/rentals/user/{user_id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Rentals of the user", body = Vec<RentalDetails>),
        (status = 403, description = "Not the caller and not an administrator")
    )
)]
pub async fn list_user_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<RentalDetails>>> {
    claims.require_self_or_admin(&user_id)?;

    let rentals = state.services.rentals.list_by_user(&user_id).await?;
    Ok(Json(rentals))
}

/// Rentals waiting for approval
#[utoipa::path(
    get,
    path = "/rentals/pending",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requested rentals", body = Vec<RentalDetails>)
    )
)]
pub async fn list_pending_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state.services.rentals.list_pending().await?;
    Ok(Json(rentals))
}

/// Active rentals past their expected return date
#[utoipa::path(
    get,
    path = "/rentals/overdue",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue rentals", body = Vec<RentalDetails>)
    )
)]
pub async fn list_overdue_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state
        .services
        .rentals
        .list_overdue(Utc::now().date_naive())
        .await?;
    Ok(Json(rentals))
}

/// Request an item
#[utoipa::path(
    post,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = CreateRental,
    responses(
        (status = 201, description = "Rental requested", body = RentalDetails),
        (status = 400, description = "Invalid return date", body = crate::error::ErrorResponse),
        (status = 404, description = "User or item not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Item not available or already requested", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateRental>,
) -> AppResult<(StatusCode, Json<RentalDetails>)> {
    let user_id = match request.user_id {
        Some(user_id) if user_id != claims.sub => {
            claims.require_admin()?;
            user_id
        }
        _ => claims.sub.clone(),
    };

    let rental = state
        .services
        .rentals
        .create(request.item_id, &user_id, request.expected_return_date)
        .await?;

    Ok((StatusCode::CREATED, Json(rental)))
}

/// Change the expected return date of an open rental
#[utoipa::path(
    put,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Rental ID")
    ),
    request_body = UpdateRental,
    responses(
        (status = 200, description = "Rental updated", body = RentalDetails),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Rental not found"),
        (status = 422, description = "Rental is closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRental>,
) -> AppResult<Json<RentalDetails>> {
    claims.require_admin()?;

    let rental = state
        .services
        .rentals
        .update_expected_return_date(id, request.expected_return_date)
        .await?;
    Ok(Json(rental))
}

/// Return a rented item
#[utoipa::path(
    post,
    path = "/rentals/{id}/return",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Rental ID")
    ),
    responses(
        (status = 200, description = "Item returned", body = RentalDetails),
        (status = 403, description = "Not the requester and not an administrator"),
        (status = 404, description = "Rental not found"),
        (status = 422, description = "Rental is not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentalDetails>> {
    let rental = state.services.rentals.get(id).await?;
    claims.require_self_or_admin(&rental.rental.user_id)?;

    let returned = state.services.rentals.return_rental(id).await?;
    Ok(Json(returned))
}
