use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::models::{AlertKind, AlertNotification};

/// Outbound alert channel. The engine decides *that* an alert fires; the
/// notifier only carries it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &AlertNotification) -> Result<(), NotifyError>;
}

/// Posts Slack-compatible attachment payloads to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, alert: &AlertNotification) -> Result<(), NotifyError> {
        let payload = webhook_payload(alert);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        info!(kind = ?alert.kind, url = %alert.url, "webhook alert sent");
        Ok(())
    }
}

fn webhook_payload(alert: &AlertNotification) -> serde_json::Value {
    let (color, title, text) = match alert.kind {
        AlertKind::Failure => {
            let mut text = format!(
                "ALERT: {} is DOWN after {} consecutive failures",
                alert.url, alert.consecutive_failures
            );
            if let Some(error) = &alert.error_message {
                text.push_str(&format!("\nError: {error}"));
            }
            ("danger", format!("\u{1F6A8} SITE DOWN: {}", alert.url), text)
        }
        AlertKind::Recovery => (
            "good",
            format!("\u{2705} SITE RECOVERED: {}", alert.url),
            format!(
                "RECOVERY: {} is back UP after {} failed checks",
                alert.url, alert.consecutive_failures
            ),
        ),
    };

    serde_json::json!({
        "attachments": [{
            "color": color,
            "title": title,
            "text": text,
            "ts": alert.timestamp.timestamp(),
        }]
    })
}

/// Fallback used when no webhook is configured: alerts only reach the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &AlertNotification) -> Result<(), NotifyError> {
        match alert.kind {
            AlertKind::Failure => warn!(
                url = %alert.url,
                consecutive_failures = alert.consecutive_failures,
                error = alert.error_message.as_deref().unwrap_or("unknown"),
                "endpoint is DOWN"
            ),
            AlertKind::Recovery => info!(
                url = %alert.url,
                "endpoint RECOVERED"
            ),
        }
        Ok(())
    }
}
