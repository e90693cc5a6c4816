pub mod webhook;

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;

use crate::config::HoneypotConfig;

pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// Server list ping (status query).
    Ping,
    /// Login attempt, kicked with the configured message.
    Join { username: String },
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Join { .. } => "join",
        }
    }
}

/// Connection metadata handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub peer: SocketAddr,
    pub protocol_version: u32,
    pub server_address: String,
    pub server_port: u16,
    /// Per-identity count after this event, starting at 1.
    pub sequence: u32,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Sink for connection events.
///
/// Implementations must return promptly; delivery happens off the session's
/// path and its outcome is never reported back.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: Notification) {}
}

/// Picks the webhook notifier when any destination is configured.
pub fn from_config(config: &HoneypotConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    if config.webhook_ping.is_none() && config.webhook_kick.is_none() {
        return Ok(Arc::new(NoopNotifier));
    }
    Ok(Arc::new(WebhookNotifier::from_config(config)?))
}
