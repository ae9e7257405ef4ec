//! Equipment item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::{Category, ItemStatus};
use crate::error::{AppError, AppResult};

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub category: Category,
    pub name: String,
    pub model: Option<String>,
    /// Required for every category except consumables
    pub serial_number: Option<String>,
    pub status: ItemStatus,
    pub note: Option<String>,
    /// User id of the admin who registered the item
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(data: CreateItem, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category: data.category,
            name: data.name.trim().to_string(),
            model: non_blank(data.model),
            serial_number: non_blank(data.serial_number),
            status: ItemStatus::Available,
            note: non_blank(data.note),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }

    /// Check the category/serial number combination
    pub fn check_serial(&self) -> AppResult<()> {
        check_serial(self.category, self.serial_number.as_deref())
    }

    /// Merge an update into the record. Blank strings clear optional text fields.
    pub fn apply(&mut self, update: UpdateItem) {
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.model.is_some() {
            self.model = non_blank(update.model);
        }
        if update.serial_number.is_some() {
            self.serial_number = non_blank(update.serial_number);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.note.is_some() {
            self.note = non_blank(update.note);
        }
        self.updated_at = Utc::now();
    }
}

pub fn check_serial(category: Category, serial_number: Option<&str>) -> AppResult<()> {
    let has_serial = serial_number.map(|s| !s.trim().is_empty()).unwrap_or(false);
    if category.requires_serial() && !has_serial {
        return Err(AppError::Validation(format!(
            "Serial number is required for {} items",
            category
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    pub category: Category,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Update item request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    pub category: Option<Category>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    /// Only consumables accept a manual status (stock on hand)
    pub status: Option<ItemStatus>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> CreateItem {
        CreateItem {
            category: Category::Router,
            name: " Router-1 ".to_string(),
            model: Some("AR6120".to_string()),
            serial_number: Some("SN-001".to_string()),
            note: Some("  ".to_string()),
        }
    }

    #[test]
    fn new_item_is_available_and_trimmed() {
        let item = Item::new(router(), "admin");
        assert_eq!(item.name, "Router-1");
        assert_eq!(item.status, ItemStatus::Available);
        assert!(item.note.is_none());
        assert!(item.check_serial().is_ok());
    }

    #[test]
    fn hardware_without_serial_is_rejected() {
        assert!(check_serial(Category::Switch, None).is_err());
        assert!(check_serial(Category::Transceiver, Some("   ")).is_err());
        assert!(check_serial(Category::Consumable, None).is_ok());
    }

    #[test]
    fn apply_clears_serial_with_blank_string() {
        let mut item = Item::new(router(), "admin");
        item.apply(UpdateItem {
            serial_number: Some(String::new()),
            ..Default::default()
        });
        assert!(item.serial_number.is_none());
        assert!(item.check_serial().is_err());
    }
}
