//! Dashboard statistics service

use chrono::NaiveDate;

use crate::{
    api::dashboard::{CategoryStats, DashboardStats},
    error::AppResult,
    models::{ApprovalStatus, Category, ItemStatus, RentalStatus},
    repository::Repository,
    services::scanner,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Registry and workflow counters, with the caller's own active rentals
    pub async fn dashboard(&self, user_id: &str, today: NaiveDate) -> AppResult<DashboardStats> {
        let items = self.repository.items.list().await?;
        let active = self
            .repository
            .rentals
            .list_by_status(RentalStatus::Active)
            .await?;

        let mut pending_approvals = 0;
        for approval in self
            .repository
            .approvals
            .list_by_status(ApprovalStatus::Pending)
            .await?
        {
            let rental = self.repository.rentals.get_by_id(approval.rental_id).await?;
            if rental.status == RentalStatus::Requested {
                pending_approvals += 1;
            }
        }

        Ok(DashboardStats {
            total_items: items.len(),
            available_items: items
                .iter()
                .filter(|i| i.status == ItemStatus::Available)
                .count(),
            my_active_rentals: active.iter().filter(|r| r.user_id == user_id).count(),
            pending_approvals,
            overdue_rentals: scanner::overdue(&active, today).len(),
        })
    }

    /// Totals per category, every category listed even when empty
    pub async fn categories(&self) -> AppResult<Vec<CategoryStats>> {
        let items = self.repository.items.list().await?;

        Ok(Category::ALL
            .iter()
            .map(|category| {
                let in_category = items.iter().filter(|i| i.category == *category);
                CategoryStats {
                    category: *category,
                    total: in_category.clone().count(),
                    available: in_category
                        .filter(|i| i.status == ItemStatus::Available)
                        .count(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{item::CreateItem, Item, Rental};
    use chrono::{Duration, Utc};

    async fn add_item(repository: &Repository, category: Category, status: ItemStatus) {
        let mut item = Item::new(
            CreateItem {
                category,
                name: "item".to_string(),
                model: None,
                serial_number: Some("SN".to_string()),
                note: None,
            },
            "admin",
        );
        item.status = status;
        repository.items.create(item).await.unwrap();
    }

    #[tokio::test]
    async fn categories_cover_every_category() {
        let repository = Repository::in_memory();
        add_item(&repository, Category::Router, ItemStatus::Available).await;
        add_item(&repository, Category::Router, ItemStatus::Unavailable).await;
        add_item(&repository, Category::Consumable, ItemStatus::Available).await;

        let stats = StatsService::new(repository).categories().await.unwrap();
        assert_eq!(stats.len(), Category::ALL.len());

        let router = stats.iter().find(|s| s.category == Category::Router).unwrap();
        assert_eq!((router.total, router.available), (2, 1));
        let switch = stats.iter().find(|s| s.category == Category::Switch).unwrap();
        assert_eq!((switch.total, switch.available), (0, 0));
    }

    #[tokio::test]
    async fn dashboard_counts_own_and_overdue_rentals() {
        let repository = Repository::in_memory();
        add_item(&repository, Category::Router, ItemStatus::Unavailable).await;
        let today = Utc::now().date_naive();

        for (user, expected) in [("u1", today - Duration::days(1)), ("u2", today)] {
            let mut rental = Rental::new(uuid::Uuid::new_v4(), user, expected);
            rental.activate(Utc::now());
            repository.rentals.create(rental).await.unwrap();
        }

        let stats = StatsService::new(repository)
            .dashboard("u1", today)
            .await
            .unwrap();
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.available_items, 0);
        assert_eq!(stats.my_active_rentals, 1);
        assert_eq!(stats.overdue_rentals, 1);
        assert_eq!(stats.pending_approvals, 0);
    }
}
