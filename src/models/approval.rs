//! Approval model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::ApprovalStatus;

/// One approver's decision gate on a rental
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Approval {
    pub id: Uuid,
    pub rental_id: Uuid,
    /// Approver queue the request was routed to
    pub approver_id: String,
    pub status: ApprovalStatus,
    pub decided_at: Option<DateTime<Utc>>,
    /// User id of the admin who took the decision
    pub decided_by: Option<String>,
    pub note: Option<String>,
}

impl Approval {
    pub fn pending(rental_id: Uuid, approver_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            rental_id,
            approver_id: approver_id.to_string(),
            status: ApprovalStatus::Pending,
            decided_at: None,
            decided_by: None,
            note: None,
        }
    }

    pub fn decide(&mut self, status: ApprovalStatus, actor: &str, note: Option<String>) {
        self.status = status;
        self.decided_at = Some(Utc::now());
        self.decided_by = Some(actor.to_string());
        self.note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    }
}

/// Approve / reject request body
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DecisionRequest {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}
