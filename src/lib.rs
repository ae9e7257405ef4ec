//! Gear Rental
//!
//! REST JSON server tracking IT equipment rentals: an item registry, a
//! request/approve/return workflow routed by category, and email
//! notifications with a per-day delivery log.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
