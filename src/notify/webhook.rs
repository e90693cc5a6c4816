use std::{net::IpAddr, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Notification, NotificationKind, Notifier};
use crate::{
    config::HoneypotConfig,
    logging::HoneypotLogger,
    threat::ratelimit::{RatelimitResult, Ratelimiter},
};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts Discord-style `{"content": ...}` messages to the configured webhooks.
pub struct WebhookNotifier {
    client: Client,
    ping: Option<String>,
    join: Option<String>,
    limiter: Option<Ratelimiter<IpAddr>>,
}

impl WebhookNotifier {
    pub fn new(
        ping: Option<String>,
        join: Option<String>,
        per_ip_rate: u32,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DELIVERY_TIMEOUT).build()?;
        Ok(Self {
            client,
            ping,
            join,
            limiter: Ratelimiter::from_rate(per_ip_rate),
        })
    }

    pub fn from_config(config: &HoneypotConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.webhook_ping.clone(),
            config.webhook_kick.clone(),
            config.notify_rate,
        )
    }

    fn destination(&self, kind: &NotificationKind) -> Option<&str> {
        match kind {
            NotificationKind::Ping => self.ping.as_deref(),
            NotificationKind::Join { .. } => self.join.as_deref(),
        }
    }

    fn throttled(&self, ip: &IpAddr) -> bool {
        match &self.limiter {
            Some(limiter) => matches!(limiter.check(ip), RatelimitResult::Disallowed { .. }),
            None => false,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) {
        let kind = notification.kind.as_str();
        let Some(url) = self.destination(&notification.kind) else {
            return;
        };
        let ip = notification.peer.ip();
        if self.throttled(&ip) {
            HoneypotLogger::notify_throttled(&ip, kind);
            return;
        }

        let request = self.client.post(url).json(&render(&notification));
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    HoneypotLogger::notify_rejected(kind, response.status().as_u16());
                }
                Ok(_) => {}
                Err(err) => HoneypotLogger::notify_failed(kind, &err),
            }
        });
    }
}

/// Renders the webhook body for one event.
///
/// Mentions are disabled so a crafted username or host cannot ping the channel.
pub fn render(notification: &Notification) -> Value {
    json!({
        "content": content(notification),
        "allowed_mentions": { "parse": [] },
    })
}

fn content(n: &Notification) -> String {
    let ip = n.peer.ip();
    match &n.kind {
        NotificationKind::Ping => format!(
            "Ping from [{}](https://ipinfo.io/{}/json) ({}:{}) v{} #{}",
            n.peer, ip, n.server_address, n.server_port, n.protocol_version, n.sequence
        ),
        NotificationKind::Join { username } => format!(
            "Join from [{name}](<https://laby.net/@{name}>) [{}](https://ipinfo.io/{}/json) ({}:{}) v{} #{}",
            n.peer,
            ip,
            n.server_address,
            n.server_port,
            n.protocol_version,
            n.sequence,
            name = username,
        ),
    }
}
