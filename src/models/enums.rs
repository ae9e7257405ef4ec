//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Router,
    Switch,
    Wireless,
    Transceiver,
    Consumable,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Router,
        Category::Switch,
        Category::Wireless,
        Category::Transceiver,
        Category::Consumable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Router => "router",
            Category::Switch => "switch",
            Category::Wireless => "wireless",
            Category::Transceiver => "transceiver",
            Category::Consumable => "consumable",
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self, Category::Consumable)
    }

    /// Hardware is tracked by serial number
    pub fn requires_serial(&self) -> bool {
        !self.is_consumable()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = AppError;

    /// Accepts the canonical names plus the short and long labels of older data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "router" | "라우터" => Ok(Category::Router),
            "switch" | "스위치" => Ok(Category::Switch),
            "wireless" | "무선" | "무선 제품군" => Ok(Category::Wireless),
            "transceiver" | "트랜시버" => Ok(Category::Transceiver),
            "consumable" | "소모품" | "소모품류" => Ok(Category::Consumable),
            other => Err(AppError::Validation(format!("Unknown category: {}", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Unavailable,
}

// ---------------------------------------------------------------------------
// RentalStatus
// ---------------------------------------------------------------------------

/// Rental lifecycle: requested -> active -> returned, or requested -> rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Requested,
    Approved,
    Active,
    Returned,
    Rejected,
}

impl RentalStatus {
    /// Statuses that hold a claim on the item
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            RentalStatus::Requested | RentalStatus::Approved | RentalStatus::Active
        )
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RentalStatus::Requested => "requested",
            RentalStatus::Approved => "approved",
            RentalStatus::Active => "active",
            RentalStatus::Returned => "returned",
            RentalStatus::Rejected => "rejected",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ApprovalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

// ---------------------------------------------------------------------------
// Department / Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    /// Product operations team, runs the equipment pool
    Operations,
    Engineering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_legacy_labels() {
        assert_eq!("Router".parse::<Category>().unwrap(), Category::Router);
        assert_eq!("라우터".parse::<Category>().unwrap(), Category::Router);
        assert_eq!("무선 제품군".parse::<Category>().unwrap(), Category::Wireless);
        assert_eq!("트랜시버".parse::<Category>().unwrap(), Category::Transceiver);
        assert_eq!("소모품".parse::<Category>().unwrap(), Category::Consumable);
        assert_eq!("소모품류".parse::<Category>().unwrap(), Category::Consumable);
        assert!("toaster".parse::<Category>().is_err());
    }

    #[test]
    fn only_hardware_requires_serial() {
        for category in Category::ALL {
            assert_eq!(category.requires_serial(), category != Category::Consumable);
        }
    }

    #[test]
    fn open_statuses() {
        assert!(RentalStatus::Requested.is_open());
        assert!(RentalStatus::Approved.is_open());
        assert!(RentalStatus::Active.is_open());
        assert!(!RentalStatus::Returned.is_open());
        assert!(!RentalStatus::Rejected.is_open());
    }
}
