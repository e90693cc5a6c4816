use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::logging::HoneypotLogger;

/// Top-level configuration for the honeypot.
///
/// Resolved from defaults, then an optional TOML file, then environment
/// variables (a `.env` file is honored through `dotenvy`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HoneypotConfig {
    /// Socket address to bind to, e.g. "0.0.0.0:25565".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Text shown to every client that tries to join.
    #[serde(default = "default_kick_message")]
    pub kick_message: String,

    /// Message of the day shown in the server list.
    #[serde(default = "default_motd")]
    pub motd: String,

    /// Advertised protocol number; `-1` marks the server as incompatible.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: i32,

    /// Display name of the advertised version, e.g. "1.21.7".
    #[serde(default = "default_protocol_text")]
    pub protocol_text: String,

    /// Advertised player slots.
    #[serde(default = "default_max_slots")]
    pub max_slots: u32,

    /// Webhook receiving server list pings.
    #[serde(default)]
    pub webhook_ping: Option<String>,

    /// Webhook receiving join attempts.
    #[serde(default)]
    pub webhook_kick: Option<String>,

    /// Maximum concurrent connections; extra connections are dropped on accept.
    #[serde(default = "default_max_conn")]
    pub max_conn: u32,

    /// Seconds a single connection may take before it is closed.
    #[serde(default = "default_session_timeout")]
    pub session_timeout: u64,

    /// Webhook deliveries allowed per second per source IP, 0 for unlimited.
    #[serde(default = "default_notify_rate")]
    pub notify_rate: u32,

    #[serde(flatten)]
    pub other_fields: HashMap<String, toml::Value>,
}

fn default_bind() -> String {
    "0.0.0.0:25565".to_string()
}

fn default_kick_message() -> String {
    "You are not Whitelisted on this Server".to_string()
}

fn default_motd() -> String {
    "A Minecraft Server".to_string()
}

fn default_protocol_version() -> i32 {
    772
}

fn default_protocol_text() -> String {
    "1.21.7".to_string()
}

fn default_max_slots() -> u32 {
    20
}

fn default_max_conn() -> u32 {
    1024
}

fn default_session_timeout() -> u64 {
    10
}

fn default_notify_rate() -> u32 {
    2
}

impl Default for HoneypotConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            kick_message: default_kick_message(),
            motd: default_motd(),
            protocol_version: default_protocol_version(),
            protocol_text: default_protocol_text(),
            max_slots: default_max_slots(),
            webhook_ping: None,
            webhook_kick: None,
            max_conn: default_max_conn(),
            session_timeout: default_session_timeout(),
            notify_rate: default_notify_rate(),
            other_fields: HashMap::new(),
        }
    }
}

impl HoneypotConfig {
    /// Resolves the full configuration for the running process.
    ///
    /// The file named by `HONEYPOT_CONFIG` must exist; the implicit
    /// `settings.toml` is only read when present.
    pub fn resolve() -> Result<Self, ConfigLoadError> {
        let mut config = match dotenvy::var("HONEYPOT_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => {
                let fallback = env::current_dir()
                    .map(|dir| dir.join("settings.toml"))
                    .unwrap_or_else(|_| PathBuf::from("settings.toml"));
                if fallback.is_file() {
                    Self::load(&fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| dotenvy::var(key).ok())?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigLoadError::Io)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(raw).map_err(ConfigLoadError::Parse)?;

        for field in &config.other_fields {
            HoneypotLogger::unknown_config_field(field.0, field.1);
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would leave the listener unable to serve anyone.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_conn == 0 {
            return Err(ConfigLoadError::Invalid {
                key: "max_conn",
                value: self.max_conn.to_string(),
            });
        }
        if self.session_timeout == 0 {
            return Err(ConfigLoadError::Invalid {
                key: "session_timeout",
                value: self.session_timeout.to_string(),
            });
        }
        Ok(())
    }

    /// Overrides fields from environment style variables.
    ///
    /// Empty values count as unset, so `WEBHOOK_PING=` keeps pings disabled
    /// unless the file configured one.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(value) = var("ADDRESS") {
            self.bind = value;
        }
        if let Some(value) = var("KICK_MESSAGE") {
            self.kick_message = value;
        }
        if let Some(value) = var("MOTD") {
            self.motd = value;
        }
        if let Some(value) = var("PROTOCOL_VERSION") {
            self.protocol_version = parse_env("PROTOCOL_VERSION", &value)?;
        }
        if let Some(value) = var("PROTOCOL_TEXT") {
            self.protocol_text = value;
        }
        if let Some(value) = var("MAX_SLOTS") {
            self.max_slots = parse_env("MAX_SLOTS", &value)?;
        }
        if let Some(value) = var("WEBHOOK_PING") {
            self.webhook_ping = Some(value);
        }
        if let Some(value) = var("WEBHOOK_KICK") {
            self.webhook_kick = Some(value);
        }
        if let Some(value) = var("MAX_CONN") {
            self.max_conn = parse_env("MAX_CONN", &value)?;
        }
        if let Some(value) = var("SESSION_TIMEOUT") {
            self.session_timeout = parse_env("SESSION_TIMEOUT", &value)?;
        }
        if let Some(value) = var("NOTIFY_RATE") {
            self.notify_rate = parse_env("NOTIFY_RATE", &value)?;
        }
        self.validate()
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigLoadError> {
    value.trim().parse().map_err(|_| ConfigLoadError::Env {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Could not open config")]
    Io(#[from] std::io::Error),
    #[error("Could not parse")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },
    #[error("{key} must be greater than zero, got {value}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_match_a_stock_server() {
        let config = HoneypotConfig::default();
        assert_eq!(config.bind, "0.0.0.0:25565");
        assert_eq!(config.protocol_version, 772);
        assert_eq!(config.protocol_text, "1.21.7");
        assert_eq!(config.max_slots, 20);
        assert!(config.webhook_ping.is_none());
        assert!(config.webhook_kick.is_none());
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = HoneypotConfig::default();
        config
            .apply_env(lookup(&[
                ("ADDRESS", "127.0.0.1:25566"),
                ("MOTD", "Survival"),
                ("PROTOCOL_VERSION", "767"),
                ("PROTOCOL_TEXT", "1.21.1"),
                ("MAX_SLOTS", "100"),
                ("WEBHOOK_PING", "https://hooks.example/ping"),
            ]))
            .unwrap();
        assert_eq!(config.bind, "127.0.0.1:25566");
        assert_eq!(config.motd, "Survival");
        assert_eq!(config.protocol_version, 767);
        assert_eq!(config.protocol_text, "1.21.1");
        assert_eq!(config.max_slots, 100);
        assert_eq!(
            config.webhook_ping.as_deref(),
            Some("https://hooks.example/ping")
        );
        assert!(config.webhook_kick.is_none());
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = HoneypotConfig::default();
        config
            .apply_env(lookup(&[("WEBHOOK_KICK", ""), ("MOTD", "")]))
            .unwrap();
        assert!(config.webhook_kick.is_none());
        assert_eq!(config.motd, "A Minecraft Server");
    }

    #[test]
    fn invalid_number_is_reported() {
        let mut config = HoneypotConfig::default();
        let err = config
            .apply_env(lookup(&[("MAX_SLOTS", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Env {
                key: "MAX_SLOTS",
                ..
            }
        ));
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = HoneypotConfig::parse(
            r#"
            motd = "Hardcore"
            protocol_version = -1
            webhook_kick = "https://hooks.example/kick"
            "#,
        )
        .unwrap();
        assert_eq!(config.motd, "Hardcore");
        assert_eq!(config.protocol_version, -1);
        assert_eq!(config.kick_message, "You are not Whitelisted on this Server");
        assert_eq!(
            config.webhook_kick.as_deref(),
            Some("https://hooks.example/kick")
        );
    }

    #[test]
    fn zero_connection_cap_is_rejected() {
        let mut config = HoneypotConfig::default();
        let err = config
            .apply_env(lookup(&[("MAX_CONN", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid {
                key: "max_conn",
                ..
            }
        ));

        let err = HoneypotConfig::parse("session_timeout = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid {
                key: "session_timeout",
                ..
            }
        ));
    }
}
