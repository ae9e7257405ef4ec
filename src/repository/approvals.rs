//! Approvals store

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Approval, ApprovalStatus},
};

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn list_by_status(&self, status: ApprovalStatus) -> AppResult<Vec<Approval>>;

    async fn list_by_rental(&self, rental_id: Uuid) -> AppResult<Vec<Approval>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Approval>;

    async fn create(&self, approval: Approval) -> AppResult<Approval>;

    async fn update(&self, approval: Approval) -> AppResult<Approval>;
}

#[derive(Default)]
pub struct MemoryApprovalStore {
    rows: RwLock<IndexMap<Uuid, Approval>>,
}

#[async_trait]
impl ApprovalStore for MemoryApprovalStore {
    async fn list_by_status(&self, status: ApprovalStatus) -> AppResult<Vec<Approval>> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|a| a.status == status).cloned().collect())
    }

    async fn list_by_rental(&self, rental_id: Uuid) -> AppResult<Vec<Approval>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|a| a.rental_id == rental_id)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Approval> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Approval {} not found", id)))
    }

    async fn create(&self, approval: Approval) -> AppResult<Approval> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&approval.id) {
            return Err(AppError::Conflict(format!(
                "Approval {} already exists",
                approval.id
            )));
        }
        rows.insert(approval.id, approval.clone());
        Ok(approval)
    }

    async fn update(&self, approval: Approval) -> AppResult<Approval> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&approval.id) {
            Some(row) => {
                *row = approval.clone();
                Ok(approval)
            }
            None => Err(AppError::NotFound(format!("Approval {} not found", approval.id))),
        }
    }
}
