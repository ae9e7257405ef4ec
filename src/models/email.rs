//! Email notification types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Rendered subject and bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailTemplate {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outgoing message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    /// Falls back to the configured sender
    pub from: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, template: EmailTemplate) -> Self {
        Self {
            to: to.into(),
            from: None,
            subject: template.subject,
            text: template.text,
            html: template.html,
        }
    }
}

/// One delivery attempt, as stored in the daily log file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailLog {
    pub timestamp: DateTime<Utc>,
    pub to: String,
    pub from: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RentalRequest,
    RentalApproved,
    RentalRejected,
    ReturnReminder,
    Overdue,
}

/// Notification with the values its template needs
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    RentalRequest {
        user_name: String,
        item_name: String,
        expected_return_date: NaiveDate,
    },
    RentalApproved {
        user_name: String,
        item_name: String,
        expected_return_date: NaiveDate,
    },
    RentalRejected {
        user_name: String,
        item_name: String,
        reason: Option<String>,
    },
    ReturnReminder {
        user_name: String,
        item_name: String,
        expected_return_date: NaiveDate,
        days_left: i64,
    },
    Overdue {
        user_name: String,
        item_name: String,
        expected_return_date: NaiveDate,
        days_overdue: i64,
    },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::RentalRequest { .. } => NotificationKind::RentalRequest,
            Notification::RentalApproved { .. } => NotificationKind::RentalApproved,
            Notification::RentalRejected { .. } => NotificationKind::RentalRejected,
            Notification::ReturnReminder { .. } => NotificationKind::ReturnReminder,
            Notification::Overdue { .. } => NotificationKind::Overdue,
        }
    }
}

/// Preview request with sample values
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub kind: NotificationKind,
    pub user_name: String,
    pub item_name: String,
    pub expected_return_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub days_left: Option<i64>,
    pub days_overdue: Option<i64>,
}

impl PreviewRequest {
    pub fn into_notification(self, today: NaiveDate) -> Notification {
        let expected_return_date = self.expected_return_date.unwrap_or(today);
        match self.kind {
            NotificationKind::RentalRequest => Notification::RentalRequest {
                user_name: self.user_name,
                item_name: self.item_name,
                expected_return_date,
            },
            NotificationKind::RentalApproved => Notification::RentalApproved {
                user_name: self.user_name,
                item_name: self.item_name,
                expected_return_date,
            },
            NotificationKind::RentalRejected => Notification::RentalRejected {
                user_name: self.user_name,
                item_name: self.item_name,
                reason: self.reason,
            },
            NotificationKind::ReturnReminder => Notification::ReturnReminder {
                user_name: self.user_name,
                item_name: self.item_name,
                expected_return_date,
                days_left: self.days_left.unwrap_or(3),
            },
            NotificationKind::Overdue => Notification::Overdue {
                user_name: self.user_name,
                item_name: self.item_name,
                expected_return_date,
                days_overdue: self.days_overdue.unwrap_or(1),
            },
        }
    }
}

/// Selected rentals for a manual send
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SendRemindersRequest {
    pub rental_ids: Vec<Uuid>,
}

/// Per-rental outcome of a manual send
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryResult {
    pub rental_id: Uuid,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendRemindersResponse {
    pub delivered: usize,
    pub failed: usize,
    pub results: Vec<DeliveryResult>,
}

/// Effective SMTP settings, without secrets
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmailConfigView {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub from: String,
    pub user_configured: bool,
    pub password_configured: bool,
}
