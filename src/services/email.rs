//! Email delivery and the per-day delivery log

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::{path::PathBuf, str::FromStr, sync::Arc};
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::email::{EmailConfigView, EmailLog, EmailMessage, EmailTemplate, Notification},
    services::templates,
};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP password not configured")]
    MissingPassword,
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Failed to build email: {0}")]
    Build(String),
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Outbound mail transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage, from: &str) -> Result<(), MailError>;
}

/// SMTP transport built from configuration
pub struct SmtpMailer {
    transport: SmtpTransport,
    from_name: Option<String>,
    password_configured: bool,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let builder = if config.smtp_implicit_tls {
            SmtpTransport::relay(&config.smtp_host)
        } else if config.smtp_use_tls {
            SmtpTransport::starttls_relay(&config.smtp_host)
        } else {
            Ok(SmtpTransport::builder_dangerous(&config.smtp_host))
        }
        .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        .port(config.smtp_port);

        let builder = if let (Some(username), Some(password)) =
            (&config.smtp_username, &config.smtp_password)
        {
            builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            builder
        };

        Ok(Self {
            transport: builder.build(),
            from_name: config.smtp_from_name.clone(),
            password_configured: config
                .smtp_password
                .as_deref()
                .map(|p| !p.is_empty())
                .unwrap_or(false),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage, from: &str) -> Result<(), MailError> {
        if !self.password_configured {
            return Err(MailError::MissingPassword);
        }

        let from_mailbox = match &self.from_name {
            Some(name) => Mailbox::from_str(&format!("{} <{}>", name, from)),
            None => Mailbox::from_str(from),
        }
        .map_err(|e| MailError::Address(format!("{}: {}", from, e)))?;

        let to_mailbox = Mailbox::from_str(&message.to)
            .map_err(|e| MailError::Address(format!("{}: {}", message.to, e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(message.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        // lettre's SmtpTransport is blocking
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Append-only JSON-lines log, one file per UTC day
#[derive(Clone)]
pub struct EmailLogStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl EmailLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("emails_{}.json", date.format("%Y-%m-%d")))
    }

    pub async fn append(&self, entry: &EmailLog) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(entry.timestamp.date_naive());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Email logged to {}", path.display());
        Ok(())
    }

    /// Entries of one day; a missing file is an empty day
    pub async fn read(&self, date: NaiveDate) -> AppResult<Vec<EmailLog>> {
        let path = self.path_for(date);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to read email log {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let entries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<EmailLog>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping malformed email log line in {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        Ok(entries)
    }
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    /// None means dry run
    mailer: Option<Arc<dyn Mailer>>,
    log: EmailLogStore,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let mailer: Option<Arc<dyn Mailer>> = if config.enabled {
            Some(Arc::new(SmtpMailer::new(&config)?))
        } else {
            tracing::info!("Email sending is disabled, deliveries are dry runs");
            None
        };
        Ok(Self::with_mailer(config, mailer))
    }

    pub fn with_mailer(config: EmailConfig, mailer: Option<Arc<dyn Mailer>>) -> Self {
        let log = EmailLogStore::new(&config.log_dir);
        Self { config, mailer, log }
    }

    pub fn render(&self, notification: &Notification) -> EmailTemplate {
        templates::render(&self.config.brand, notification)
    }

    /// Render and deliver a notification
    pub async fn notify(&self, to: &str, notification: &Notification) -> bool {
        let message = EmailMessage::new(to, self.render(notification));
        self.deliver(&message).await
    }

    /// Send (or dry-run) a message and log the attempt. Returns false on failure.
    pub async fn deliver(&self, message: &EmailMessage) -> bool {
        let from = message
            .from
            .clone()
            .unwrap_or_else(|| self.config.smtp_from.clone());

        let mut entry = EmailLog {
            timestamp: Utc::now(),
            to: message.to.clone(),
            from: from.clone(),
            subject: message.subject.clone(),
            text: Some(message.text.clone()),
            html: Some(message.html.clone()),
            sent: false,
            error: None,
        };

        let result = match &self.mailer {
            Some(mailer) => mailer.send(message, &from).await.map(|_| true),
            None => {
                tracing::info!("[DRY RUN] Email would be sent to {}: {}", message.to, message.subject);
                Ok(false)
            }
        };

        let delivered = match result {
            Ok(sent) => {
                entry.sent = sent;
                if sent {
                    tracing::info!("Email sent to {}", message.to);
                }
                true
            }
            Err(e) => {
                tracing::warn!("Email to {} failed: {}", message.to, e);
                entry.error = Some(e.to_string());
                false
            }
        };

        if let Err(e) = self.log.append(&entry).await {
            tracing::error!("Failed to log email: {}", e);
        }

        delivered
    }

    pub async fn logs(&self, date: NaiveDate) -> AppResult<Vec<EmailLog>> {
        self.log.read(date).await
    }

    pub fn config_view(&self) -> EmailConfigView {
        EmailConfigView {
            enabled: self.config.enabled,
            host: self.config.smtp_host.clone(),
            port: self.config.smtp_port,
            from: self.config.smtp_from.clone(),
            user_configured: self.config.smtp_username.is_some(),
            password_configured: self
                .config
                .smtp_password
                .as_deref()
                .map(|p| !p.is_empty())
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> EmailConfig {
        EmailConfig {
            log_dir: dir.path().to_string_lossy().into_owned(),
            ..EmailConfig::default()
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "kim@example.com".to_string(),
            from: None,
            subject: "Hello".to_string(),
            text: "text".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn dry_run_logs_unsent_entry() {
        let dir = TempDir::new().unwrap();
        let service = EmailService::with_mailer(config(&dir), None);

        assert!(service.deliver(&message()).await);

        let logs = service.logs(Utc::now().date_naive()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].sent);
        assert!(logs[0].error.is_none());
        assert_eq!(logs[0].from, "noreply@example.com");
    }

    #[tokio::test]
    async fn transport_failure_is_logged_and_swallowed() {
        let dir = TempDir::new().unwrap();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_, _| Err(MailError::Transport("connection refused".to_string())));
        let service = EmailService::with_mailer(config(&dir), Some(Arc::new(mailer)));

        assert!(!service.deliver(&message()).await);

        let logs = service.logs(Utc::now().date_naive()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].sent);
        assert_eq!(
            logs[0].error.as_deref(),
            Some("SMTP delivery failed: connection refused")
        );
    }

    #[tokio::test]
    async fn successful_send_is_marked_sent() {
        let dir = TempDir::new().unwrap();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|message, from| message.to == "kim@example.com" && from == "noreply@example.com")
            .times(1)
            .returning(|_, _| Ok(()));
        let service = EmailService::with_mailer(config(&dir), Some(Arc::new(mailer)));

        assert!(service.deliver(&message()).await);
        let logs = service.logs(Utc::now().date_naive()).await.unwrap();
        assert!(logs[0].sent);
    }

    #[tokio::test]
    async fn reader_skips_malformed_lines_and_missing_days() {
        let dir = TempDir::new().unwrap();
        let store = EmailLogStore::new(dir.path());
        let today = Utc::now().date_naive();

        let entry = EmailLog {
            timestamp: Utc::now(),
            to: "a@example.com".to_string(),
            from: "b@example.com".to_string(),
            subject: "s".to_string(),
            text: None,
            html: None,
            sent: true,
            error: None,
        };
        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(
            store.path_for(today),
            format!(
                "{}\nnot json\n\n",
                serde_json::to_string(&entry).unwrap()
            ),
        )
        .await
        .unwrap();

        assert_eq!(store.read(today).await.unwrap().len(), 1);
        let yesterday = today.pred_opt().unwrap();
        assert!(store.read(yesterday).await.unwrap().is_empty());
    }

    #[test]
    fn config_view_hides_secrets() {
        let view = EmailService::with_mailer(
            EmailConfig {
                smtp_password: Some("secret".to_string()),
                ..EmailConfig::default()
            },
            None,
        )
        .config_view();
        assert!(view.password_configured);
        assert!(!view.user_configured);
    }
}
