//! Rental model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{approval::Approval, enums::RentalStatus, item::Item, user::UserShort};

/// A request-to-return lifecycle binding a user to an item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rental {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: String,
    /// Set when the rental becomes active
    pub rental_date: Option<DateTime<Utc>>,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    pub fn new(item_id: Uuid, user_id: &str, expected_return_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            item_id,
            user_id: user_id.to_string(),
            rental_date: None,
            expected_return_date,
            actual_return_date: None,
            status: RentalStatus::Requested,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.status = RentalStatus::Active;
        self.rental_date = Some(now);
        self.updated_at = now;
    }

    /// Whole days past the expected return date, if any
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        let days = (today - self.expected_return_date).num_days();
        (self.status == RentalStatus::Active && days > 0).then_some(days)
    }

    /// Whole days left before the expected return date, if the rental is active
    /// and not yet overdue
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        let days = (self.expected_return_date - today).num_days();
        (self.status == RentalStatus::Active && days >= 0).then_some(days)
    }
}

/// Rental with item, requester and approvals attached
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RentalDetails {
    #[serde(flatten)]
    pub rental: Rental,
    pub item: Option<Item>,
    pub user: Option<UserShort>,
    pub approvals: Vec<Approval>,
}

/// Create rental request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRental {
    pub item_id: Uuid,
    pub expected_return_date: NaiveDate,
    /// Admins may file a request on behalf of someone else
    pub user_id: Option<String>,
}

/// Update rental request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRental {
    pub expected_return_date: NaiveDate,
}

/// Active rental close to its expected return date
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReminderCandidate {
    pub rental: RentalDetails,
    pub days_left: i64,
}

/// Active rental past its expected return date
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueCandidate {
    pub rental: RentalDetails,
    pub days_overdue: i64,
}
