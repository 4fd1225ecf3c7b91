//! Alert notification
//!
//! Fire-and-forget push to the configured recipients. Failures are logged
//! per recipient and never retried within the cycle; a broken notifier
//! must not stall or abort detection processing.
//!
//! Alert copy is composed locally from structured fields. If a generative
//! collaborator is ever added for richer copy, it plugs in behind a
//! structured `{decision, message}` contract, never free-text parsing.

use crate::models::FireEvent;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("No recipients configured")]
    NoRecipients,
}

/// Best-effort alert sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, text: &str) -> Result<(), NotifyError>;
}

/// Compose the alert text for a newly escalated event.
pub fn compose_alert(event: &FireEvent) -> String {
    format!(
        "FIREWATCH ALERT\nZone: {}\nIntensity: {:.1} MW\nLand use: {}\nSources: {}\nMap: https://maps.google.com/?q={},{}",
        event.zone.as_str(),
        event.frp_mw,
        event.land_type.as_str(),
        event.source,
        event.latitude,
        event.longitude,
    )
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram broadcast notifier: one sendMessage per configured chat id.
pub struct TelegramNotifier {
    http_client: reqwest::Client,
    bot_token: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_ids: Vec<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            bot_token: bot_token.to_string(),
            chat_ids,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn push(&self, text: &str) -> Result<(), NotifyError> {
        if self.chat_ids.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        for chat_id in &self.chat_ids {
            let result = self
                .http_client
                .post(&url)
                .json(&SendMessage { chat_id, text })
                .send()
                .await;

            // Redact recipient ids down to a recognizable suffix
            let suffix = &chat_id[chat_id.len().saturating_sub(3)..];
            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(recipient = %format!("...{}", suffix), "Alert delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        recipient = %format!("...{}", suffix),
                        status = response.status().as_u16(),
                        "Alert delivery rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(recipient = %format!("...{}", suffix), error = %e, "Alert delivery failed");
                }
            }
        }

        Ok(())
    }
}

/// Fallback notifier used when no bot token is configured: alerts land in
/// the log instead of vanishing.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn push(&self, text: &str) -> Result<(), NotifyError> {
        tracing::warn!(alert = %text, "No notifier configured, alert logged only");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LandType, Zone};
    use chrono::Utc;
    use uuid::Uuid;

    fn event() -> FireEvent {
        let now = Utc::now();
        FireEvent {
            id: Uuid::new_v4(),
            latitude: 23.5,
            longitude: 87.9,
            first_seen: now,
            last_seen: now,
            source: "VIIRS_SNPP".to_string(),
            alert_count: 1,
            frp_mw: 42.5,
            confidence: 90.0,
            est_area_m2: 56_250.0,
            zone: Zone::WestBengal,
            land_type: LandType::Farm,
        }
    }

    #[test]
    fn alert_text_carries_the_key_fields() {
        let text = compose_alert(&event());
        assert!(text.contains("WEST_BENGAL"));
        assert!(text.contains("42.5 MW"));
        assert!(text.contains("FARM"));
        assert!(text.contains("https://maps.google.com/?q=23.5,87.9"));
    }

    #[tokio::test]
    async fn empty_recipient_list_is_an_error() {
        let notifier =
            TelegramNotifier::new("token", Vec::new(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            notifier.push("test").await,
            Err(NotifyError::NoRecipients)
        ));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.push("test").await.is_ok());
    }
}
