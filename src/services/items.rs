//! Item registry service

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::RentalsConfig,
    error::{AppError, AppResult},
    models::{
        item::{CreateItem, UpdateItem},
        Category, Item, ItemStatus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
    rentals: RentalsConfig,
    workflow: Arc<Mutex<()>>,
}

impl ItemsService {
    pub fn new(repository: Repository, rentals: RentalsConfig, workflow: Arc<Mutex<()>>) -> Self {
        Self {
            repository,
            rentals,
            workflow,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Item>> {
        self.repository.items.list().await
    }

    pub async fn list_available(&self) -> AppResult<Vec<Item>> {
        self.repository.items.list_by_status(ItemStatus::Available).await
    }

    pub async fn list_by_category(&self, category: Category) -> AppResult<Vec<Item>> {
        self.repository.items.list_by_category(category).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    pub async fn create(&self, data: CreateItem, created_by: &str) -> AppResult<Item> {
        data.validate()?;
        let item = Item::new(data, created_by);
        item.check_serial()?;

        let item = self.repository.items.create(item).await?;
        tracing::info!("Item {} ({}) registered by {}", item.id, item.name, created_by);
        Ok(item)
    }

    pub async fn update(&self, id: Uuid, data: UpdateItem) -> AppResult<Item> {
        data.validate()?;
        let _guard = self.workflow.lock().await;

        let current = self.repository.items.get_by_id(id).await?;
        let has_open_rentals = self.has_open_rentals(id).await?;

        if let Some(category) = data.category {
            if category != current.category && has_open_rentals {
                return Err(AppError::Conflict(
                    "Cannot change the category of an item with open rentals".to_string(),
                ));
            }
        }

        let mut item = current;
        let status = data.status;
        item.apply(data);
        item.check_serial()?;

        if status.is_some() && self.rentals.is_exclusive(item.category) {
            return Err(AppError::Validation(format!(
                "Status of {} items follows their rentals",
                item.category
            )));
        }
        if self.rentals.is_exclusive(item.category) && !has_open_rentals {
            // a consumable marked out of stock may have become hardware
            item.status = ItemStatus::Available;
        }

        self.repository.items.update(item).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _guard = self.workflow.lock().await;

        self.repository.items.get_by_id(id).await?;
        if self.has_open_rentals(id).await? {
            return Err(AppError::Conflict(
                "Cannot delete an item with open rentals".to_string(),
            ));
        }

        self.repository.items.delete(id).await?;
        tracing::info!("Item {} deleted", id);
        Ok(())
    }

    async fn has_open_rentals(&self, item_id: Uuid) -> AppResult<bool> {
        let rentals = self.repository.rentals.list_by_item(item_id).await?;
        Ok(rentals.iter().any(|r| r.status.is_open()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ItemsService {
        ItemsService::new(
            Repository::in_memory(),
            RentalsConfig::default(),
            Arc::new(Mutex::new(())),
        )
    }

    fn create(category: Category, serial: Option<&str>) -> CreateItem {
        CreateItem {
            category,
            name: "Item".to_string(),
            model: None,
            serial_number: serial.map(str::to_string),
            note: None,
        }
    }

    #[tokio::test]
    async fn hardware_requires_serial_number() {
        let service = service();
        let err = service
            .create(create(Category::Wireless, None), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.list().await.unwrap().is_empty());

        tokio_test::assert_ok!(service.create(create(Category::Consumable, None), "admin").await);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let mut data = create(Category::Consumable, None);
        data.name = String::new();
        assert!(matches!(
            service().create(data, "admin").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn switching_consumable_to_hardware_needs_serial() {
        let service = service();
        let item = service
            .create(create(Category::Consumable, None), "admin")
            .await
            .unwrap();

        let update = UpdateItem {
            category: Some(Category::Switch),
            ..Default::default()
        };
        assert!(service.update(item.id, update).await.is_err());

        let update = UpdateItem {
            category: Some(Category::Switch),
            serial_number: Some("SW-1".to_string()),
            ..Default::default()
        };
        let updated = service.update(item.id, update).await.unwrap();
        assert_eq!(updated.category, Category::Switch);
    }

    #[tokio::test]
    async fn manual_status_only_for_shared_consumables() {
        let service = service();
        let router = service
            .create(create(Category::Router, Some("R-1")), "admin")
            .await
            .unwrap();
        let update = UpdateItem {
            status: Some(ItemStatus::Unavailable),
            ..Default::default()
        };
        assert!(service.update(router.id, update.clone()).await.is_err());
        assert!(service.get_by_id(router.id).await.unwrap().is_available());

        let cables = service
            .create(create(Category::Consumable, None), "admin")
            .await
            .unwrap();
        let updated = service.update(cables.id, update).await.unwrap();
        assert_eq!(updated.status, ItemStatus::Unavailable);
    }

    #[tokio::test]
    async fn delete_missing_item_is_not_found() {
        assert!(matches!(
            service().delete(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
