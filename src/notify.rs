//! Bounded notification queue drained by a background worker.
//!
//! Producers never wait: a full or closed queue drops the notification with a
//! warning. The worker retries each delivery with a linearly growing pause.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use crate::collaborators::{CollaboratorError, Notification, Notifier};

/// Delivers one notification to its final destination.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    pub fn new(
        capacity: usize,
        sender: Arc<dyn NotificationSender>,
    ) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = NotificationWorker {
            rx,
            sender,
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        };
        (Self { tx }, worker)
    }
}

impl Notifier for NotificationQueue {
    fn enqueue(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => warn!(
                recipient_id = dropped.recipient_id,
                kind = %dropped.kind,
                "Notification queue full, dropping notification"
            ),
            Err(TrySendError::Closed(dropped)) => warn!(
                recipient_id = dropped.recipient_id,
                kind = %dropped.kind,
                "Notification worker stopped, dropping notification"
            ),
        }
    }
}

pub struct NotificationWorker {
    rx: mpsc::Receiver<Notification>,
    sender: Arc<dyn NotificationSender>,
    max_attempts: u32,
    backoff: Duration,
}

impl NotificationWorker {
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Runs until every queue handle is dropped and the backlog is drained.
    pub async fn run(mut self) {
        while let Some(notification) = self.rx.recv().await {
            self.deliver(&notification).await;
        }
        debug!("Notification worker stopped");
    }

    async fn deliver(&self, notification: &Notification) {
        for attempt in 1..=self.max_attempts {
            match self.sender.send(notification).await {
                Ok(()) => {
                    debug!(
                        recipient_id = notification.recipient_id,
                        kind = %notification.kind,
                        attempt,
                        "Notification delivered"
                    );
                    return;
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        error = %e,
                        recipient_id = notification.recipient_id,
                        attempt,
                        "Notification delivery failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        recipient_id = notification.recipient_id,
                        kind = %notification.kind,
                        attempts = self.max_attempts,
                        "Giving up on notification"
                    );
                }
            }
        }
    }
}

/// Writes notifications to the in-app `notifications` table.
pub struct MySqlNotificationSender {
    pool: MySqlPool,
}

impl MySqlNotificationSender {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSender for MySqlNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, type, title, message, data)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.kind.to_string())
        .bind(notification.title.as_str())
        .bind(notification.message.as_str())
        .bind(Json(&notification.data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
