//! Data models for the rental server

pub mod approval;
pub mod email;
pub mod enums;
pub mod item;
pub mod rental;
pub mod user;

// Re-export commonly used types
pub use approval::Approval;
pub use enums::{ApprovalStatus, Category, Department, ItemStatus, RentalStatus, Role};
pub use item::Item;
pub use rental::{Rental, RentalDetails};
pub use user::{User, UserShort};
