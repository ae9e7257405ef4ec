//! Notification outbox
//!
//! Workflow operations enqueue messages here instead of talking to SMTP on the
//! request path. A background worker drains the queue and retries failed
//! deliveries with exponential backoff.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::sleep,
};
use uuid::Uuid;

use crate::{config::NotificationsConfig, models::email::EmailMessage, services::email::EmailService};

#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub message: EmailMessage,
    pub enqueued_at: DateTime<Utc>,
}

/// Retry behavior for outbox deliveries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl From<&NotificationsConfig> for RetryPolicy {
    fn from(config: &NotificationsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Producer side, cheap to clone into services
#[derive(Clone)]
pub struct Outbox {
    sender: mpsc::Sender<OutboxEntry>,
}

impl Outbox {
    /// Create the queue and the worker that drains it
    pub fn new(capacity: usize, email: EmailService, retry: RetryPolicy) -> (Self, OutboxWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { sender },
            OutboxWorker {
                receiver,
                email,
                retry,
            },
        )
    }

    /// Queue a message. Never blocks; a full or closed queue drops the message.
    pub fn enqueue(&self, message: EmailMessage) -> bool {
        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            message,
            enqueued_at: Utc::now(),
        };
        let id = entry.id;
        let to = entry.message.to.clone();

        match self.sender.try_send(entry) {
            Ok(()) => {
                tracing::debug!("Queued email {} to {}", id, to);
                true
            }
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(
                    "Outbox full, dropping email to {}: {}",
                    entry.message.to,
                    entry.message.subject
                );
                false
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(
                    "Outbox closed, dropping email to {}: {}",
                    entry.message.to,
                    entry.message.subject
                );
                false
            }
        }
    }
}

pub struct OutboxWorker {
    receiver: mpsc::Receiver<OutboxEntry>,
    email: EmailService,
    retry: RetryPolicy,
}

impl OutboxWorker {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain until every producer is gone. Each entry retries on its own task so
    /// a failing mailbox does not hold up the rest of the queue.
    pub async fn run(mut self) {
        tracing::info!("Outbox worker started");
        while let Some(entry) = self.receiver.recv().await {
            let email = self.email.clone();
            let retry = self.retry.clone();
            tokio::spawn(async move {
                deliver_with_retry(&email, &entry, &retry).await;
            });
        }
        tracing::info!("Outbox worker stopped");
    }
}

/// Deliver one entry, retrying failures. Every attempt lands in the email log.
pub async fn deliver_with_retry(email: &EmailService, entry: &OutboxEntry, retry: &RetryPolicy) -> bool {
    let mut delay = retry.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        if email.deliver(&entry.message).await {
            if attempt > 1 {
                tracing::info!("Email {} delivered after {} attempts", entry.id, attempt);
            }
            return true;
        }

        if attempt >= retry.max_attempts {
            tracing::error!(
                "Giving up on email {} to {} after {} attempts (queued at {})",
                entry.id,
                entry.message.to,
                attempt,
                entry.enqueued_at
            );
            return false;
        }

        tracing::warn!(
            "Email {} attempt {} failed, retrying in {:?}",
            entry.id,
            attempt,
            delay
        );
        sleep(delay).await;
        delay = (delay * 2).min(retry.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EmailConfig,
        services::email::{MailError, MockMailer},
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tempfile::TempDir;

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn entry() -> OutboxEntry {
        OutboxEntry {
            id: Uuid::new_v4(),
            message: EmailMessage {
                to: "kim@example.com".to_string(),
                from: None,
                subject: "Rental approved".to_string(),
                text: "text".to_string(),
                html: "html".to_string(),
            },
            enqueued_at: Utc::now(),
        }
    }

    fn email_with(dir: &TempDir, mailer: MockMailer) -> EmailService {
        EmailService::with_mailer(
            EmailConfig {
                log_dir: dir.path().to_string_lossy().into_owned(),
                ..EmailConfig::default()
            },
            Some(Arc::new(mailer)),
        )
    }

    #[tokio::test]
    async fn retries_until_delivery_succeeds() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(3).returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(MailError::Transport("timeout".to_string()))
            } else {
                Ok(())
            }
        });
        let email = email_with(&dir, mailer);

        assert!(deliver_with_retry(&email, &entry(), &fast_retry(5)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let logs = email.logs(Utc::now().date_naive()).await.unwrap();
        let sent: Vec<bool> = logs.iter().map(|l| l.sent).collect();
        assert_eq!(sent, vec![false, false, true]);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(2)
            .returning(|_, _| Err(MailError::MissingPassword));
        let email = email_with(&dir, mailer);

        assert!(!deliver_with_retry(&email, &entry(), &fast_retry(2)).await);
        let logs = email.logs(Utc::now().date_naive()).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.error.is_some()));
    }

    #[tokio::test]
    async fn worker_drains_queued_messages() {
        let dir = TempDir::new().unwrap();
        let email = EmailService::with_mailer(
            EmailConfig {
                log_dir: dir.path().to_string_lossy().into_owned(),
                ..EmailConfig::default()
            },
            None,
        );
        let (outbox, worker) = Outbox::new(4, email.clone(), fast_retry(1));
        let handle = worker.spawn();

        assert!(outbox.enqueue(entry().message));

        let today = Utc::now().date_naive();
        let mut logged = 0;
        for _ in 0..100 {
            logged = email.logs(today).await.unwrap().len();
            if logged == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(logged, 1);

        drop(outbox);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let dir = TempDir::new().unwrap();
        let email = EmailService::with_mailer(
            EmailConfig {
                log_dir: dir.path().to_string_lossy().into_owned(),
                ..EmailConfig::default()
            },
            None,
        );
        // worker never runs, so the single slot stays taken
        let (outbox, _worker) = Outbox::new(1, email, fast_retry(1));
        assert!(outbox.enqueue(entry().message));
        assert!(!outbox.enqueue(entry().message));
    }
}
