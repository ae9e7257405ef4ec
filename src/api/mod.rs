//! API handlers for the rental REST endpoints

pub mod approvals;
pub mod auth;
pub mod dashboard;
pub mod emails;
pub mod health;
pub mod items;
pub mod openapi;
pub mod rentals;
pub mod users;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Optional JSON body. An empty body yields `None`; any other body must parse
/// as `T`, whatever its content type, or the request fails with 400.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(OptionalJson(Some(value)))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/available", get(items::list_available_items))
        .route("/items/category/:category", get(items::list_items_by_category))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        // Rentals
        .route("/rentals", get(rentals::list_rentals).post(rentals::create_rental))
        .route("/rentals/pending", get(rentals::list_pending_rentals))
        .route("/rentals/overdue", get(rentals::list_overdue_rentals))
        .route("/rentals/user/:user_id", get(rentals::list_user_rentals))
        .route("/rentals/:id", get(rentals::get_rental).put(rentals::update_rental))
        .route("/rentals/:id/return", post(rentals::return_rental))
        // Approvals
        .route("/approvals/pending", get(approvals::list_pending_approvals))
        .route("/approvals/rental/:rental_id", get(approvals::list_rental_approvals))
        .route("/approvals/:id/approve", post(approvals::approve))
        .route("/approvals/:id/reject", post(approvals::reject))
        // Email tools
        .route("/emails/logs", get(emails::get_logs))
        .route("/emails/config", get(emails::get_config))
        .route("/emails/return-reminders", get(emails::list_return_reminders))
        .route("/emails/overdue-rentals", get(emails::list_overdue_rentals))
        .route("/emails/preview", post(emails::preview))
        .route("/emails/send-return-reminders", post(emails::send_return_reminders))
        .route("/emails/send-overdue-reminders", post(emails::send_overdue_reminders))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_stats))
        .route("/dashboard/categories", get(dashboard::get_categories))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
