//! Business logic services

pub mod email;
pub mod items;
pub mod outbox;
pub mod rentals;
pub mod routing;
pub mod scanner;
pub mod stats;
pub mod templates;
pub mod users;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub items: items::ItemsService,
    pub rentals: rentals::RentalsService,
    pub scanner: scanner::ScannerService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
    pub outbox: outbox::Outbox,
}

impl Services {
    /// Create all services with the given repository. The returned worker must
    /// be spawned for queued notifications to go out.
    pub fn new(config: &AppConfig, repository: Repository) -> AppResult<(Self, outbox::OutboxWorker)> {
        let email = email::EmailService::new(config.email.clone())?;
        let (outbox, worker) = outbox::Outbox::new(
            config.notifications.outbox_capacity,
            email.clone(),
            outbox::RetryPolicy::from(&config.notifications),
        );

        // Serializes every transition touching rentals, approvals and item status
        let workflow = Arc::new(Mutex::new(()));

        let rentals = rentals::RentalsService::new(
            repository.clone(),
            routing::ApprovalRouter::new(config.approvals.clone()),
            email.clone(),
            outbox.clone(),
            config.rentals.clone(),
            workflow.clone(),
        );

        let services = Self {
            users: users::UsersService::new(
                repository.clone(),
                config.auth.clone(),
                config.users.clone(),
            )?,
            items: items::ItemsService::new(repository.clone(), config.rentals.clone(), workflow),
            scanner: scanner::ScannerService::new(
                repository.clone(),
                rentals.clone(),
                email.clone(),
                outbox.clone(),
                config.notifications.clone(),
            ),
            rentals,
            stats: stats::StatsService::new(repository),
            email,
            outbox,
        };

        Ok((services, worker))
    }
}
