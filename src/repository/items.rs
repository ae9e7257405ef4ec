//! Items store

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Category, Item, ItemStatus},
};

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items in registration order
    async fn list(&self) -> AppResult<Vec<Item>>;

    async fn list_by_status(&self, status: ItemStatus) -> AppResult<Vec<Item>>;

    async fn list_by_category(&self, category: Category) -> AppResult<Vec<Item>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item>;

    async fn create(&self, item: Item) -> AppResult<Item>;

    /// Replace the stored record with the same id
    async fn update(&self, item: Item) -> AppResult<Item>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Default)]
pub struct MemoryItemStore {
    rows: RwLock<IndexMap<Uuid, Item>>,
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn list(&self) -> AppResult<Vec<Item>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn list_by_status(&self, status: ItemStatus) -> AppResult<Vec<Item>> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|i| i.status == status).cloned().collect())
    }

    async fn list_by_category(&self, category: Category) -> AppResult<Vec<Item>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|i| i.category == category)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    async fn create(&self, item: Item) -> AppResult<Item> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&item.id) {
            return Err(AppError::Conflict(format!("Item {} already exists", item.id)));
        }
        rows.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, item: Item) -> AppResult<Item> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&item.id) {
            Some(row) => {
                *row = item.clone();
                Ok(item)
            }
            None => Err(AppError::NotFound(format!("Item {} not found", item.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // shift_remove keeps listing order stable
        match self.rows.write().await.shift_remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Item {} not found", id))),
        }
    }
}
