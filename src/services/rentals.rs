//! Rental workflow service
//!
//! State machine:
//!
//! ```text
//! requested --(all approvals approved)--> active --(return)--> returned
//!     \--(any approval rejected)--> rejected
//! ```
//!
//! Transitions touch the rental, its approvals and the item together. They run
//! under the workflow lock shared with the item registry, and every check
//! happens before the first write.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::RentalsConfig,
    error::{AppError, AppResult},
    models::{
        email::{EmailMessage, Notification},
        Approval, ApprovalStatus, Item, ItemStatus, Rental, RentalDetails, RentalStatus, User,
        UserShort,
    },
    repository::Repository,
    services::{email::EmailService, outbox::Outbox, routing::ApprovalRouter, scanner},
};

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
    router: ApprovalRouter,
    email: EmailService,
    outbox: Outbox,
    rentals: RentalsConfig,
    workflow: Arc<Mutex<()>>,
}

impl RentalsService {
    pub fn new(
        repository: Repository,
        router: ApprovalRouter,
        email: EmailService,
        outbox: Outbox,
        rentals: RentalsConfig,
        workflow: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            repository,
            router,
            email,
            outbox,
            rentals,
            workflow,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn list(&self) -> AppResult<Vec<RentalDetails>> {
        let rentals = self.repository.rentals.list().await?;
        self.details_many(rentals).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<RentalDetails> {
        let rental = self.repository.rentals.get_by_id(id).await?;
        self.details(rental).await
    }

    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<RentalDetails>> {
        let rentals = self.repository.rentals.list_by_user(user_id).await?;
        self.details_many(rentals).await
    }

    /// Rentals waiting for approval
    pub async fn list_pending(&self) -> AppResult<Vec<RentalDetails>> {
        let rentals = self
            .repository
            .rentals
            .list_by_status(RentalStatus::Requested)
            .await?;
        self.details_many(rentals).await
    }

    pub async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<RentalDetails>> {
        let active = self
            .repository
            .rentals
            .list_by_status(RentalStatus::Active)
            .await?;
        let overdue = scanner::overdue(&active, today)
            .into_iter()
            .map(|(rental, _)| rental)
            .collect();
        self.details_many(overdue).await
    }

    /// Approvals still waiting on a decision for a rental that can still move
    pub async fn pending_approvals(&self) -> AppResult<Vec<Approval>> {
        let pending = self
            .repository
            .approvals
            .list_by_status(ApprovalStatus::Pending)
            .await?;

        let mut open = Vec::with_capacity(pending.len());
        for approval in pending {
            let rental = self.repository.rentals.get_by_id(approval.rental_id).await?;
            if rental.status == RentalStatus::Requested {
                open.push(approval);
            }
        }
        Ok(open)
    }

    pub async fn approvals_for_rental(&self, rental_id: Uuid) -> AppResult<Vec<Approval>> {
        self.repository.rentals.get_by_id(rental_id).await?;
        self.repository.approvals.list_by_rental(rental_id).await
    }

    pub async fn details(&self, rental: Rental) -> AppResult<RentalDetails> {
        let item = self.repository.items.get_by_id(rental.item_id).await.ok();
        let user = self
            .repository
            .users
            .get_by_id(&rental.user_id)
            .await
            .ok()
            .map(|u| UserShort::from(&u));
        let approvals = self.repository.approvals.list_by_rental(rental.id).await?;

        Ok(RentalDetails {
            rental,
            item,
            user,
            approvals,
        })
    }

    pub async fn details_many(&self, rentals: Vec<Rental>) -> AppResult<Vec<RentalDetails>> {
        let mut result = Vec::with_capacity(rentals.len());
        for rental in rentals {
            result.push(self.details(rental).await?);
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// File a rental request and route it to its approvers
    pub async fn create(
        &self,
        item_id: Uuid,
        user_id: &str,
        expected_return_date: NaiveDate,
    ) -> AppResult<RentalDetails> {
        let _guard = self.workflow.lock().await;

        let user = self.repository.users.get_by_id(user_id).await?;
        let item = self.repository.items.get_by_id(item_id).await?;

        if expected_return_date < Utc::now().date_naive() {
            return Err(AppError::Validation(
                "Expected return date is in the past".to_string(),
            ));
        }
        if !item.is_available() {
            return Err(AppError::Unavailable(format!(
                "Item {} is not available for rental",
                item.name
            )));
        }
        if self.rentals.is_exclusive(item.category) {
            let existing = self.repository.rentals.list_by_item(item.id).await?;
            if let Some(open) = existing.iter().find(|r| r.status.is_open()) {
                return Err(AppError::Conflict(format!(
                    "Item {} already has a {} rental",
                    item.name, open.status
                )));
            }
        }

        let queues = self.router.route(item.category);
        let rental = self
            .repository
            .rentals
            .create(Rental::new(item.id, &user.id, expected_return_date))
            .await?;

        for queue in &queues {
            self.repository
                .approvals
                .create(Approval::pending(rental.id, queue))
                .await?;
        }

        tracing::info!(
            "Rental {} requested by {} for item {} ({} approval(s))",
            rental.id,
            user.id,
            item.id,
            queues.len()
        );

        if queues.is_empty() {
            let rental = self.activate(rental, item, &user).await?;
            return self.details(rental).await;
        }

        for queue in &queues {
            match self.router.queue_email(queue) {
                Some(address) => self.queue_notification(
                    address,
                    &Notification::RentalRequest {
                        user_name: user.name.clone(),
                        item_name: item.name.clone(),
                        expected_return_date,
                    },
                ),
                None => tracing::debug!("No mailbox configured for approver queue {}", queue),
            }
        }

        self.details(rental).await
    }

    /// Approve one gate; the rental activates once every gate is approved
    pub async fn approve(
        &self,
        approval_id: Uuid,
        actor: &str,
        note: Option<String>,
    ) -> AppResult<Approval> {
        let _guard = self.workflow.lock().await;

        let (mut approval, rental) = self.decidable(approval_id).await?;
        approval.decide(ApprovalStatus::Approved, actor, note);
        let approval = self.repository.approvals.update(approval).await?;

        tracing::info!("Approval {} approved by {}", approval.id, actor);

        let approvals = self.repository.approvals.list_by_rental(rental.id).await?;
        if approvals.iter().all(|a| a.status == ApprovalStatus::Approved) {
            let item = self.repository.items.get_by_id(rental.item_id).await?;
            let user = self.repository.users.get_by_id(&rental.user_id).await?;
            self.activate(rental, item, &user).await?;
        }

        Ok(approval)
    }

    /// Reject one gate; the rental is rejected whatever the other gates say
    pub async fn reject(
        &self,
        approval_id: Uuid,
        actor: &str,
        note: Option<String>,
    ) -> AppResult<Approval> {
        let _guard = self.workflow.lock().await;

        let (mut approval, mut rental) = self.decidable(approval_id).await?;
        approval.decide(ApprovalStatus::Rejected, actor, note);
        let approval = self.repository.approvals.update(approval).await?;

        rental.status = RentalStatus::Rejected;
        rental.updated_at = Utc::now();
        let rental = self.repository.rentals.update(rental).await?;

        tracing::info!("Rental {} rejected by {}", rental.id, actor);

        let item = self.repository.items.get_by_id(rental.item_id).await?;
        match self.repository.users.get_by_id(&rental.user_id).await {
            Ok(user) => self.queue_notification(
                &user.email,
                &Notification::RentalRejected {
                    user_name: user.name,
                    item_name: item.name,
                    reason: approval.note.clone(),
                },
            ),
            Err(e) => tracing::warn!("Cannot notify requester of rental {}: {}", rental.id, e),
        }

        Ok(approval)
    }

    /// Close an active rental and free the item
    pub async fn return_rental(&self, rental_id: Uuid) -> AppResult<RentalDetails> {
        let _guard = self.workflow.lock().await;

        let mut rental = self.repository.rentals.get_by_id(rental_id).await?;
        if rental.status != RentalStatus::Active {
            return Err(AppError::BusinessRule(format!(
                "Rental {} is {}, only active rentals can be returned",
                rental.id, rental.status
            )));
        }
        let mut item = self.repository.items.get_by_id(rental.item_id).await?;

        let now = Utc::now();
        rental.status = RentalStatus::Returned;
        rental.actual_return_date = Some(now);
        rental.updated_at = now;
        let rental = self.repository.rentals.update(rental).await?;

        if self.rentals.is_exclusive(item.category) {
            item.status = ItemStatus::Available;
            item.updated_at = now;
            self.repository.items.update(item).await?;
        }

        tracing::info!("Rental {} returned", rental.id);
        self.details(rental).await
    }

    /// Move the expected return date of an open rental
    pub async fn update_expected_return_date(
        &self,
        rental_id: Uuid,
        expected_return_date: NaiveDate,
    ) -> AppResult<RentalDetails> {
        let _guard = self.workflow.lock().await;

        let mut rental = self.repository.rentals.get_by_id(rental_id).await?;
        if !rental.status.is_open() {
            return Err(AppError::BusinessRule(format!(
                "Rental {} is {} and can no longer change",
                rental.id, rental.status
            )));
        }

        rental.expected_return_date = expected_return_date;
        rental.updated_at = Utc::now();
        let rental = self.repository.rentals.update(rental).await?;
        self.details(rental).await
    }

    /// Load an approval that may still be decided, with its rental
    async fn decidable(&self, approval_id: Uuid) -> AppResult<(Approval, Rental)> {
        let approval = self.repository.approvals.get_by_id(approval_id).await?;
        if approval.status != ApprovalStatus::Pending {
            return Err(AppError::BusinessRule(format!(
                "Approval {} has already been decided",
                approval.id
            )));
        }

        let rental = self.repository.rentals.get_by_id(approval.rental_id).await?;
        if rental.status != RentalStatus::Requested {
            return Err(AppError::BusinessRule(format!(
                "Rental {} is {} and no longer awaits approval",
                rental.id, rental.status
            )));
        }
        Ok((approval, rental))
    }

    /// Caller holds the workflow lock
    async fn activate(&self, mut rental: Rental, mut item: Item, user: &User) -> AppResult<Rental> {
        let now = Utc::now();
        rental.activate(now);
        let rental = self.repository.rentals.update(rental).await?;

        if self.rentals.is_exclusive(item.category) {
            item.status = ItemStatus::Unavailable;
            item.updated_at = now;
            self.repository.items.update(item.clone()).await?;
        }

        tracing::info!("Rental {} is now active", rental.id);

        self.queue_notification(
            &user.email,
            &Notification::RentalApproved {
                user_name: user.name.clone(),
                item_name: item.name,
                expected_return_date: rental.expected_return_date,
            },
        );
        Ok(rental)
    }

    fn queue_notification(&self, to: &str, notification: &Notification) {
        let message = EmailMessage::new(to, self.email.render(notification));
        if !self.outbox.enqueue(message) {
            tracing::warn!("{:?} notification to {} was not queued", notification.kind(), to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ApprovalsConfig, ConsumablePolicy, EmailConfig, NotificationsConfig},
        models::{item::CreateItem, Category, Department, Role},
        services::outbox::{OutboxWorker, RetryPolicy},
    };
    use chrono::Duration;

    struct Fixture {
        service: RentalsService,
        repository: Repository,
        _worker: OutboxWorker,
    }

    fn fixture_with(rentals: RentalsConfig, approvals: ApprovalsConfig) -> Fixture {
        let repository = Repository::in_memory();
        let email = EmailService::with_mailer(EmailConfig::default(), None);
        let retry = RetryPolicy::from(&NotificationsConfig::default());
        let (outbox, worker) = Outbox::new(64, email.clone(), retry);
        let service = RentalsService::new(
            repository.clone(),
            ApprovalRouter::new(approvals),
            email,
            outbox,
            rentals,
            Arc::new(Mutex::new(())),
        );
        Fixture {
            service,
            repository,
            _worker: worker,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RentalsConfig::default(), ApprovalsConfig::default())
    }

    async fn add_user(repository: &Repository, id: &str) -> User {
        repository
            .users
            .upsert(User {
                id: id.to_string(),
                name: format!("User {}", id),
                department: Department::Engineering,
                role: Role::User,
                email: format!("{}@example.com", id),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn add_item(repository: &Repository, category: Category, name: &str) -> Item {
        let data = CreateItem {
            category,
            name: name.to_string(),
            model: None,
            serial_number: Some(format!("SN-{}", name)),
            note: None,
        };
        repository.items.create(Item::new(data, "admin")).await.unwrap()
    }

    fn in_days(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    #[tokio::test]
    async fn router_lifecycle_from_request_to_return() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Router, "Router-1").await;

        let created = f.service.create(item.id, "u1", in_days(7)).await.unwrap();
        assert_eq!(created.rental.status, RentalStatus::Requested);
        assert_eq!(created.approvals.len(), 1);
        assert_eq!(created.approvals[0].status, ApprovalStatus::Pending);
        assert_eq!(created.approvals[0].approver_id, "tech-manager");

        f.service
            .approve(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        let active = f.service.get(created.rental.id).await.unwrap();
        assert_eq!(active.rental.status, RentalStatus::Active);
        assert!(active.rental.rental_date.is_some());
        assert_eq!(
            f.repository.items.get_by_id(item.id).await.unwrap().status,
            ItemStatus::Unavailable
        );

        let returned = f.service.return_rental(created.rental.id).await.unwrap();
        assert_eq!(returned.rental.status, RentalStatus::Returned);
        assert!(returned.rental.actual_return_date.is_some());
        assert_eq!(
            f.repository.items.get_by_id(item.id).await.unwrap().status,
            ItemStatus::Available
        );
    }

    #[tokio::test]
    async fn unavailable_item_cannot_be_requested() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let mut item = add_item(&f.repository, Category::Switch, "SW-1").await;
        item.status = ItemStatus::Unavailable;
        f.repository.items.update(item.clone()).await.unwrap();

        for _ in 0..3 {
            let err = f.service.create(item.id, "u1", in_days(3)).await.unwrap_err();
            assert!(matches!(err, AppError::Unavailable(_)));
        }
        assert!(f.repository.rentals.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_request_for_same_hardware_fails() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        add_user(&f.repository, "u2").await;
        let item = add_item(&f.repository, Category::Transceiver, "SFP-1").await;

        f.service.create(item.id, "u1", in_days(3)).await.unwrap();
        let err = f.service.create(item.id, "u2", in_days(3)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn consumables_allow_concurrent_rentals_by_default() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        add_user(&f.repository, "u2").await;
        let item = add_item(&f.repository, Category::Consumable, "Patch cables").await;

        let first = f.service.create(item.id, "u1", in_days(3)).await.unwrap();
        let second = f.service.create(item.id, "u2", in_days(3)).await.unwrap();
        assert_eq!(first.approvals[0].approver_id, "product-team-manager");

        f.service.approve(first.approvals[0].id, "admin", None).await.unwrap();
        f.service.approve(second.approvals[0].id, "admin", None).await.unwrap();
        assert!(f.repository.items.get_by_id(item.id).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn exclusive_policy_treats_consumables_like_hardware() {
        let f = fixture_with(
            RentalsConfig {
                consumable_policy: ConsumablePolicy::Exclusive,
            },
            ApprovalsConfig::default(),
        );
        add_user(&f.repository, "u1").await;
        add_user(&f.repository, "u2").await;
        let item = add_item(&f.repository, Category::Consumable, "Console cable").await;

        let first = f.service.create(item.id, "u1", in_days(3)).await.unwrap();
        assert!(f.service.create(item.id, "u2", in_days(3)).await.is_err());

        f.service.approve(first.approvals[0].id, "admin", None).await.unwrap();
        assert!(!f.repository.items.get_by_id(item.id).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn activation_happens_exactly_once() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Wireless, "AP-1").await;
        let created = f.service.create(item.id, "u1", in_days(3)).await.unwrap();
        let approval_id = created.approvals[0].id;

        f.service.approve(approval_id, "admin", None).await.unwrap();
        let first = f.service.get(created.rental.id).await.unwrap();

        let err = f.service.approve(approval_id, "admin", None).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        let second = f.service.get(created.rental.id).await.unwrap();
        assert_eq!(first.rental.rental_date, second.rental.rental_date);
    }

    #[tokio::test]
    async fn all_gates_must_approve_and_any_rejection_wins() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Router, "Router-2").await;
        let created = f.service.create(item.id, "u1", in_days(3)).await.unwrap();

        // second gate added out of band
        let extra = f
            .repository
            .approvals
            .create(Approval::pending(created.rental.id, "security"))
            .await
            .unwrap();

        f.service
            .approve(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        let rental = f.service.get(created.rental.id).await.unwrap();
        assert_eq!(rental.rental.status, RentalStatus::Requested);
        assert!(f.repository.items.get_by_id(item.id).await.unwrap().is_available());

        let rejected = f
            .service
            .reject(extra.id, "admin", Some("  no stock  ".to_string()))
            .await
            .unwrap();
        assert_eq!(rejected.note.as_deref(), Some("no stock"));
        let rental = f.service.get(created.rental.id).await.unwrap();
        assert_eq!(rental.rental.status, RentalStatus::Rejected);
        assert!(f.service.pending_approvals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_rental_frees_item_for_new_requests() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Router, "Router-3").await;
        let created = f.service.create(item.id, "u1", in_days(3)).await.unwrap();

        f.service
            .reject(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        tokio_test::assert_ok!(f.service.create(item.id, "u1", in_days(3)).await);
    }

    #[tokio::test]
    async fn only_active_rentals_can_be_returned() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Switch, "SW-2").await;
        let created = f.service.create(item.id, "u1", in_days(3)).await.unwrap();

        let err = f.service.return_rental(created.rental.id).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        f.service
            .approve(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        f.service.return_rental(created.rental.id).await.unwrap();
        assert!(f.service.return_rental(created.rental.id).await.is_err());
    }

    #[tokio::test]
    async fn overdue_list_drops_returned_rentals() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Router, "Router-4").await;
        let created = f.service.create(item.id, "u1", in_days(1)).await.unwrap();
        f.service
            .approve(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        f.service
            .update_expected_return_date(created.rental.id, in_days(-2))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let overdue = f.service.list_overdue(today).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].rental.id, created.rental.id);

        f.service.return_rental(created.rental.id).await.unwrap();
        assert!(f.service.list_overdue(today).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_validation() {
        let f = fixture();
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Router, "Router-5").await;

        assert!(matches!(
            f.service.create(item.id, "ghost", in_days(1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.create(Uuid::new_v4(), "u1", in_days(1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.create(item.id, "u1", in_days(-1)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn category_without_queue_activates_immediately() {
        let f = fixture_with(
            RentalsConfig::default(),
            ApprovalsConfig {
                consumable_queue: String::new(),
                ..ApprovalsConfig::default()
            },
        );
        add_user(&f.repository, "u1").await;
        let item = add_item(&f.repository, Category::Consumable, "Labels").await;

        let created = f.service.create(item.id, "u1", in_days(2)).await.unwrap();
        assert!(created.approvals.is_empty());
        assert_eq!(created.rental.status, RentalStatus::Active);
    }
}
