//! Rentals store

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Rental, RentalStatus},
};

#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Rental>>;

    async fn list_by_status(&self, status: RentalStatus) -> AppResult<Vec<Rental>>;

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Rental>>;

    async fn list_by_item(&self, item_id: Uuid) -> AppResult<Vec<Rental>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Rental>;

    async fn create(&self, rental: Rental) -> AppResult<Rental>;

    async fn update(&self, rental: Rental) -> AppResult<Rental>;
}

#[derive(Default)]
pub struct MemoryRentalStore {
    rows: RwLock<IndexMap<Uuid, Rental>>,
}

impl MemoryRentalStore {
    async fn filtered(&self, predicate: impl Fn(&Rental) -> bool) -> Vec<Rental> {
        self.rows
            .read()
            .await
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RentalStore for MemoryRentalStore {
    async fn list(&self) -> AppResult<Vec<Rental>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn list_by_status(&self, status: RentalStatus) -> AppResult<Vec<Rental>> {
        Ok(self.filtered(|r| r.status == status).await)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Rental>> {
        Ok(self.filtered(|r| r.user_id == user_id).await)
    }

    async fn list_by_item(&self, item_id: Uuid) -> AppResult<Vec<Rental>> {
        Ok(self.filtered(|r| r.item_id == item_id).await)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Rental> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    async fn create(&self, rental: Rental) -> AppResult<Rental> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&rental.id) {
            return Err(AppError::Conflict(format!("Rental {} already exists", rental.id)));
        }
        rows.insert(rental.id, rental.clone());
        Ok(rental)
    }

    async fn update(&self, rental: Rental) -> AppResult<Rental> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&rental.id) {
            Some(row) => {
                *row = rental.clone();
                Ok(rental)
            }
            None => Err(AppError::NotFound(format!("Rental {} not found", rental.id))),
        }
    }
}
