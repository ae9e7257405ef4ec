//! Users store

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn get_by_id(&self, id: &str) -> AppResult<User>;

    /// Insert or refresh a user; the first creation date is kept
    async fn upsert(&self, user: User) -> AppResult<User>;
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<IndexMap<String, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.rows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn upsert(&self, mut user: User) -> AppResult<User> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&user.id) {
            user.created_at = existing.created_at;
        }
        rows.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}
