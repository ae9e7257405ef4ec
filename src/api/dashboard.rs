//! Dashboard endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::Category};

use super::AuthenticatedUser;

/// Dashboard counters
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Registered items
    pub total_items: usize,
    /// Items that can be requested now
    pub available_items: usize,
    /// Active rentals of the caller
    pub my_active_rentals: usize,
    /// Approvals waiting on a decision
    pub pending_approvals: usize,
    /// Active rentals past their expected return date
    pub overdue_rentals: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryStats {
    pub category: Category,
    pub total: usize,
    pub available: usize,
}

/// Dashboard counters for the caller
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counters", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state
        .services
        .stats
        .dashboard(&claims.sub, Utc::now().date_naive())
        .await?;
    Ok(Json(stats))
}

/// Item counts per category
#[utoipa::path(
    get,
    path = "/dashboard/categories",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Per-category totals", body = Vec<CategoryStats>)
    )
)]
pub async fn get_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<CategoryStats>>> {
    let stats = state.services.stats.categories().await?;
    Ok(Json(stats))
}
