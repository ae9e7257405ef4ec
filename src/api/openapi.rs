//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{approvals, auth, dashboard, emails, health, items, rentals, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gear Rental API",
        version = "0.3.0",
        description = "Equipment rental tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::me,
        // Users
        users::list_users,
        // Items
        items::list_items,
        items::list_available_items,
        items::list_items_by_category,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Rentals
        rentals::list_rentals,
        rentals::get_rental,
        rentals::list_user_rentals,
        rentals::list_pending_rentals,
        rentals::list_overdue_rentals,
        rentals::create_rental,
        rentals::update_rental,
        rentals::return_rental,
        // Approvals
        approvals::list_pending_approvals,
        approvals::list_rental_approvals,
        approvals::approve,
        approvals::reject,
        // Emails
        emails::get_logs,
        emails::get_config,
        emails::list_return_reminders,
        emails::list_overdue_rentals,
        emails::preview,
        emails::send_return_reminders,
        emails::send_overdue_reminders,
        // Dashboard
        dashboard::get_stats,
        dashboard::get_categories,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::UserClaims,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::enums::Department,
            crate::models::enums::Role,
            // Items
            crate::models::item::Item,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            crate::models::enums::Category,
            crate::models::enums::ItemStatus,
            // Rentals
            crate::models::rental::Rental,
            crate::models::rental::RentalDetails,
            crate::models::rental::CreateRental,
            crate::models::rental::UpdateRental,
            crate::models::rental::ReminderCandidate,
            crate::models::rental::OverdueCandidate,
            crate::models::enums::RentalStatus,
            // Approvals
            crate::models::approval::Approval,
            crate::models::approval::DecisionRequest,
            crate::models::enums::ApprovalStatus,
            // Emails
            crate::models::email::EmailLog,
            crate::models::email::EmailTemplate,
            crate::models::email::EmailConfigView,
            crate::models::email::NotificationKind,
            crate::models::email::PreviewRequest,
            crate::models::email::SendRemindersRequest,
            crate::models::email::SendRemindersResponse,
            crate::models::email::DeliveryResult,
            // Dashboard
            dashboard::DashboardStats,
            dashboard::CategoryStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User directory"),
        (name = "items", description = "Equipment registry"),
        (name = "rentals", description = "Rental workflow"),
        (name = "approvals", description = "Approval decisions"),
        (name = "emails", description = "Email notifications and logs"),
        (name = "dashboard", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
