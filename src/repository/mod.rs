//! Repository layer
//!
//! Each entity is reached through a store trait so the in-memory tables can be
//! swapped for a database-backed implementation without touching services.

pub mod approvals;
pub mod items;
pub mod rentals;
pub mod users;

use std::sync::Arc;

pub use approvals::{ApprovalStore, MemoryApprovalStore};
pub use items::{ItemStore, MemoryItemStore};
pub use rentals::{MemoryRentalStore, RentalStore};
pub use users::{MemoryUserStore, UserStore};

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub items: Arc<dyn ItemStore>,
    pub rentals: Arc<dyn RentalStore>,
    pub approvals: Arc<dyn ApprovalStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    pub fn new(
        items: Arc<dyn ItemStore>,
        rentals: Arc<dyn RentalStore>,
        approvals: Arc<dyn ApprovalStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            items,
            rentals,
            approvals,
            users,
        }
    }

    /// Process-local tables, lost on restart
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryItemStore::default()),
            Arc::new(MemoryRentalStore::default()),
            Arc::new(MemoryApprovalStore::default()),
            Arc::new(MemoryUserStore::default()),
        )
    }
}
