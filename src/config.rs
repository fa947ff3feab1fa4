//! Configuration types.
//!
//! Everything the relay needs from the environment is read once at startup
//! into [`RelayConfig`] and handed to the components that need it.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_PORT: u16 = 5002;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// 10 MB per uploaded document.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
/// Four capped documents plus the text fields, with headroom.
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Bot API credentials and destination.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub chat_id: String,
    /// Base URL without trailing slash.
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            chat_id: chat_id.into(),
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Transient upload storage settings.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub uploads: UploadConfig,
    /// Cap on the whole request body.
    pub max_body_bytes: usize,
}

impl RelayConfig {
    /// Load from process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key: ".env".into(),
                    message: e.to_string(),
                });
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let chat_id = require("TELEGRAM_CHAT_ID")?;
        let mut telegram = TelegramConfig::new(bot_token, chat_id.trim());
        if let Some(base) = get("TELEGRAM_API_BASE") {
            telegram = telegram.with_api_base(base);
        }

        let host = match get("HOST") {
            Some(raw) => parse_value("HOST", &raw)?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match get("PORT") {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let uploads = UploadConfig {
            dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_file_bytes: match get("MAX_FILE_BYTES") {
                Some(raw) => parse_value("MAX_FILE_BYTES", &raw)?,
                None => DEFAULT_MAX_FILE_BYTES,
            },
        };

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => parse_value("MAX_BODY_BYTES", &raw)?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            server: ServerConfig { host, port },
            telegram,
            uploads,
            max_body_bytes,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_set() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("TELEGRAM_CHAT_ID", "-100200300"),
        ]))
        .unwrap();

        assert_eq!(config.telegram.bot_token.expose_secret(), "123:ABC");
        assert_eq!(config.telegram.chat_id, "-100200300");
        assert_eq!(config.telegram.api_base, DEFAULT_TELEGRAM_API_BASE);
        assert_eq!(config.server.port, 5002);
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:5002");
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert_eq!(config.uploads.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn missing_token_is_reported_by_name() {
        let err = RelayConfig::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "1")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn blank_chat_id_counts_as_missing() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("TELEGRAM_API_BASE", "http://127.0.0.1:9000/"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8088"),
            ("UPLOAD_DIR", "/tmp/intake"),
            ("MAX_FILE_BYTES", "1024"),
            ("MAX_BODY_BYTES", "8192"),
        ]))
        .unwrap();

        assert_eq!(config.telegram.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:8088");
        assert_eq!(config.uploads.dir, PathBuf::from("/tmp/intake"));
        assert_eq!(config.uploads.max_file_bytes, 1024);
        assert_eq!(config.max_body_bytes, 8192);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }
}
