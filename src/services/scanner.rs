//! Due-date scanning: return reminders and overdue notices

use chrono::{NaiveDate, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle, time};
use uuid::Uuid;

use crate::{
    config::NotificationsConfig,
    error::{AppError, AppResult},
    models::{
        email::{
            DeliveryResult, EmailMessage, Notification, NotificationKind, SendRemindersResponse,
        },
        rental::{OverdueCandidate, ReminderCandidate},
        Rental, RentalStatus,
    },
    repository::Repository,
    services::{email::EmailService, outbox::Outbox, rentals::RentalsService},
};

/// Active rentals past their expected return date, most overdue first
pub fn overdue(rentals: &[Rental], today: NaiveDate) -> Vec<(Rental, i64)> {
    let mut result: Vec<(Rental, i64)> = rentals
        .iter()
        .filter_map(|r| r.days_overdue(today).map(|days| (r.clone(), days)))
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

/// Active rentals due within `days` days (today included), soonest first
pub fn due_within(rentals: &[Rental], today: NaiveDate, days: i64) -> Vec<(Rental, i64)> {
    let mut result: Vec<(Rental, i64)> = rentals
        .iter()
        .filter_map(|r| {
            r.days_left(today)
                .filter(|left| *left <= days)
                .map(|left| (r.clone(), left))
        })
        .collect();
    result.sort_by_key(|(_, left)| *left);
    result
}

/// Counts of notices queued by one scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub reminders: usize,
    pub overdue: usize,
}

#[derive(Clone)]
pub struct ScannerService {
    repository: Repository,
    rentals: RentalsService,
    email: EmailService,
    outbox: Outbox,
    config: NotificationsConfig,
    /// (rental, kind) -> day of the last notice sent by the periodic scan
    notified: Arc<Mutex<HashMap<(Uuid, NotificationKind), NaiveDate>>>,
}

impl ScannerService {
    pub fn new(
        repository: Repository,
        rentals: RentalsService,
        email: EmailService,
        outbox: Outbox,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            repository,
            rentals,
            email,
            outbox,
            config,
            notified: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn default_reminder_days(&self) -> i64 {
        self.config.reminder_days
    }

    async fn active_rentals(&self) -> AppResult<Vec<Rental>> {
        self.repository
            .rentals
            .list_by_status(RentalStatus::Active)
            .await
    }

    pub async fn reminder_candidates(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> AppResult<Vec<ReminderCandidate>> {
        if days < 0 {
            return Err(AppError::Validation(
                "Reminder window must not be negative".to_string(),
            ));
        }

        let active = self.active_rentals().await?;
        let mut candidates = Vec::new();
        for (rental, days_left) in due_within(&active, today, days) {
            candidates.push(ReminderCandidate {
                rental: self.rentals.details(rental).await?,
                days_left,
            });
        }
        Ok(candidates)
    }

    pub async fn overdue_candidates(&self, today: NaiveDate) -> AppResult<Vec<OverdueCandidate>> {
        let active = self.active_rentals().await?;
        let mut candidates = Vec::new();
        for (rental, days_overdue) in overdue(&active, today) {
            candidates.push(OverdueCandidate {
                rental: self.rentals.details(rental).await?,
                days_overdue,
            });
        }
        Ok(candidates)
    }

    /// Send return reminders for the selected rentals now, bypassing the outbox
    pub async fn send_return_reminders(
        &self,
        rental_ids: &[Uuid],
        today: NaiveDate,
    ) -> SendRemindersResponse {
        let mut results = Vec::with_capacity(rental_ids.len());
        for id in rental_ids {
            let outcome = match self.reminder_for(*id, today).await {
                Ok((to, notification)) => Ok(self.email.notify(&to, &notification).await),
                Err(e) => Err(e),
            };
            results.push(delivery_result(*id, outcome));
        }
        summarize(results)
    }

    /// Send overdue notices now. Without a selection every overdue rental is notified.
    pub async fn send_overdue_reminders(
        &self,
        rental_ids: Option<&[Uuid]>,
        today: NaiveDate,
    ) -> AppResult<SendRemindersResponse> {
        let ids: Vec<Uuid> = match rental_ids {
            Some(ids) => ids.to_vec(),
            None => overdue(&self.active_rentals().await?, today)
                .into_iter()
                .map(|(rental, _)| rental.id)
                .collect(),
        };

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match self.overdue_for(id, today).await {
                Ok((to, notification)) => Ok(self.email.notify(&to, &notification).await),
                Err(e) => Err(e),
            };
            results.push(delivery_result(id, outcome));
        }
        Ok(summarize(results))
    }

    /// Queue reminders and overdue notices, at most one of each per rental and day
    pub async fn scan(&self, today: NaiveDate) -> AppResult<ScanReport> {
        let active = self.active_rentals().await?;
        let mut report = ScanReport::default();

        let mut notified = self.notified.lock().await;
        notified.retain(|_, day| *day == today);

        for (rental, _) in due_within(&active, today, self.config.reminder_days) {
            let key = (rental.id, NotificationKind::ReturnReminder);
            if notified.contains_key(&key) {
                continue;
            }
            match self.reminder_for(rental.id, today).await {
                Ok((to, notification)) => {
                    if self.queue(&to, &notification) {
                        notified.insert(key, today);
                        report.reminders += 1;
                    }
                }
                Err(e) => tracing::warn!("Skipping reminder for rental {}: {}", rental.id, e),
            }
        }

        for (rental, _) in overdue(&active, today) {
            let key = (rental.id, NotificationKind::Overdue);
            if notified.contains_key(&key) {
                continue;
            }
            match self.overdue_for(rental.id, today).await {
                Ok((to, notification)) => {
                    if self.queue(&to, &notification) {
                        notified.insert(key, today);
                        report.overdue += 1;
                    }
                }
                Err(e) => tracing::warn!("Skipping overdue notice for rental {}: {}", rental.id, e),
            }
        }

        Ok(report)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let period = Duration::from_secs(self.config.scan_interval_minutes.max(1) * 60);
        let mut interval = time::interval(period);
        tracing::info!("Due-date scanner started, running every {:?}", period);

        loop {
            interval.tick().await;
            match self.scan(Utc::now().date_naive()).await {
                Ok(report) => tracing::info!(
                    "Due-date scan queued {} reminder(s) and {} overdue notice(s)",
                    report.reminders,
                    report.overdue
                ),
                Err(e) => tracing::error!("Due-date scan failed: {}", e),
            }
        }
    }

    async fn reminder_for(&self, id: Uuid, today: NaiveDate) -> AppResult<(String, Notification)> {
        let rental = self.repository.rentals.get_by_id(id).await?;
        let days_left = rental.days_left(today).ok_or_else(|| {
            AppError::BusinessRule(format!(
                "Rental {} is not an active rental before its due date",
                id
            ))
        })?;
        let (to, user_name, item_name) = self.recipient(&rental).await?;

        Ok((
            to,
            Notification::ReturnReminder {
                user_name,
                item_name,
                expected_return_date: rental.expected_return_date,
                days_left,
            },
        ))
    }

    async fn overdue_for(&self, id: Uuid, today: NaiveDate) -> AppResult<(String, Notification)> {
        let rental = self.repository.rentals.get_by_id(id).await?;
        let days_overdue = rental
            .days_overdue(today)
            .ok_or_else(|| AppError::BusinessRule(format!("Rental {} is not overdue", id)))?;
        let (to, user_name, item_name) = self.recipient(&rental).await?;

        Ok((
            to,
            Notification::Overdue {
                user_name,
                item_name,
                expected_return_date: rental.expected_return_date,
                days_overdue,
            },
        ))
    }

    async fn recipient(&self, rental: &Rental) -> AppResult<(String, String, String)> {
        let user = self.repository.users.get_by_id(&rental.user_id).await?;
        let item = self.repository.items.get_by_id(rental.item_id).await?;
        Ok((user.email, user.name, item.name))
    }

    fn queue(&self, to: &str, notification: &Notification) -> bool {
        self.outbox
            .enqueue(EmailMessage::new(to, self.email.render(notification)))
    }
}

fn delivery_result(rental_id: Uuid, outcome: AppResult<bool>) -> DeliveryResult {
    match outcome {
        Ok(true) => DeliveryResult {
            rental_id,
            delivered: true,
            error: None,
        },
        Ok(false) => DeliveryResult {
            rental_id,
            delivered: false,
            error: Some("Delivery failed, see the email log".to_string()),
        },
        Err(e) => DeliveryResult {
            rental_id,
            delivered: false,
            error: Some(e.to_string()),
        },
    }
}

fn summarize(results: Vec<DeliveryResult>) -> SendRemindersResponse {
    let delivered = results.iter().filter(|r| r.delivered).count();
    SendRemindersResponse {
        delivered,
        failed: results.len() - delivered,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ApprovalsConfig, EmailConfig, RentalsConfig},
        models::{item::CreateItem, Category, Department, Item, Role, User},
        services::{
            outbox::{OutboxWorker, RetryPolicy},
            routing::ApprovalRouter,
        },
    };
    use chrono::Duration as Days;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn active(expected: &str) -> Rental {
        let mut rental = Rental::new(Uuid::new_v4(), "u1", date(expected));
        rental.activate(Utc::now());
        rental
    }

    #[test]
    fn overdue_is_strictly_after_expected_date() {
        let today = date("2026-05-10");
        let rentals = vec![
            active("2026-05-10"),
            active("2026-05-09"),
            active("2026-05-01"),
            Rental::new(Uuid::new_v4(), "u2", date("2026-05-01")),
        ];

        let days: Vec<i64> = overdue(&rentals, today).into_iter().map(|(_, d)| d).collect();
        assert_eq!(days, vec![9, 1]);
    }

    #[test]
    fn reminder_window_is_inclusive() {
        let today = date("2026-05-10");
        let rentals = vec![
            active("2026-05-13"),
            active("2026-05-14"),
            active("2026-05-10"),
            active("2026-05-09"),
        ];

        let days: Vec<i64> = due_within(&rentals, today, 3)
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        assert_eq!(days, vec![0, 3]);
    }

    struct Fixture {
        scanner: ScannerService,
        rentals: RentalsService,
        repository: Repository,
        _dir: TempDir,
        _worker: OutboxWorker,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repository = Repository::in_memory();
        let email = EmailService::with_mailer(
            EmailConfig {
                log_dir: dir.path().to_string_lossy().into_owned(),
                ..EmailConfig::default()
            },
            None,
        );
        let notifications = NotificationsConfig::default();
        let (outbox, worker) =
            Outbox::new(64, email.clone(), RetryPolicy::from(&notifications));
        let rentals = RentalsService::new(
            repository.clone(),
            ApprovalRouter::new(ApprovalsConfig::default()),
            email.clone(),
            outbox.clone(),
            RentalsConfig::default(),
            Arc::new(Mutex::new(())),
        );
        let scanner = ScannerService::new(
            repository.clone(),
            rentals.clone(),
            email,
            outbox,
            notifications,
        );
        Fixture {
            scanner,
            rentals,
            repository,
            _dir: dir,
            _worker: worker,
        }
    }

    /// Active rental of a fresh router, due in `days` days
    async fn active_rental(f: &Fixture, days: i64) -> Uuid {
        f.repository
            .users
            .upsert(User {
                id: "u1".to_string(),
                name: "Kim".to_string(),
                department: Department::Engineering,
                role: Role::User,
                email: "kim@example.com".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let item = f
            .repository
            .items
            .create(Item::new(
                CreateItem {
                    category: Category::Router,
                    name: "Router".to_string(),
                    model: None,
                    serial_number: Some(Uuid::new_v4().to_string()),
                    note: None,
                },
                "admin",
            ))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let created = f.rentals.create(item.id, "u1", today).await.unwrap();
        f.rentals
            .approve(created.approvals[0].id, "admin", None)
            .await
            .unwrap();
        f.rentals
            .update_expected_return_date(created.rental.id, today + Days::days(days))
            .await
            .unwrap();
        created.rental.id
    }

    #[tokio::test]
    async fn candidates_carry_rental_details() {
        let f = fixture();
        let due = active_rental(&f, 2).await;
        let late = active_rental(&f, -4).await;
        let today = Utc::now().date_naive();

        let reminders = f.scanner.reminder_candidates(today, 3).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].rental.rental.id, due);
        assert_eq!(reminders[0].days_left, 2);
        assert_eq!(reminders[0].rental.user.as_ref().unwrap().name, "Kim");

        let overdue = f.scanner.overdue_candidates(today).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].rental.rental.id, late);
        assert_eq!(overdue[0].days_overdue, 4);

        assert!(f.scanner.reminder_candidates(today, -1).await.is_err());
    }

    #[tokio::test]
    async fn manual_send_reports_each_rental() {
        let f = fixture();
        let due = active_rental(&f, 1).await;
        let today = Utc::now().date_naive();

        let response = f
            .scanner
            .send_return_reminders(&[due, Uuid::new_v4()], today)
            .await;
        assert_eq!(response.delivered, 1);
        assert_eq!(response.failed, 1);
        assert!(response.results[0].delivered);
        assert!(response.results[1].error.is_some());

        let logs = f.scanner.email.logs(today).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].to, "kim@example.com");
    }

    #[tokio::test]
    async fn overdue_send_defaults_to_every_overdue_rental() {
        let f = fixture();
        active_rental(&f, -1).await;
        active_rental(&f, -3).await;
        active_rental(&f, 5).await;

        let response = f
            .scanner
            .send_overdue_reminders(None, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(response.delivered, 2);
        assert_eq!(response.failed, 0);
    }

    #[tokio::test]
    async fn periodic_scan_notifies_once_per_day() {
        let f = fixture();
        active_rental(&f, 0).await;
        active_rental(&f, -2).await;
        let today = Utc::now().date_naive();

        let first = f.scanner.scan(today).await.unwrap();
        assert_eq!(first, ScanReport { reminders: 1, overdue: 1 });

        let again = f.scanner.scan(today).await.unwrap();
        assert_eq!(again, ScanReport::default());

        let tomorrow = f.scanner.scan(today + Days::days(1)).await.unwrap();
        assert_eq!(tomorrow.overdue, 2);
    }
}
