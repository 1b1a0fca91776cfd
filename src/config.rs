//! Конфигурация консоли: TOML-файл + переопределение токена из окружения.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const TOKEN_ENV: &str = "KOMON_BOT_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Не удалось прочитать конфиг {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Некорректный конфиг: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Не задан токен бота (bot_token или {TOKEN_ENV})")]
    MissingToken,
    #[error("webapp_url должен быть http(s)-адресом с /webapp в пути: {0}")]
    WebappUrl(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot_token: Option<String>,
    pub webapp_url: String,
    #[serde(default = "default_drafts_db_path")]
    pub drafts_db_path: PathBuf,
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
    #[serde(default = "default_contacts_page_size")]
    pub contacts_page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(skip)]
    api_base: String,
}

fn default_drafts_db_path() -> PathBuf {
    PathBuf::from("/var/lib/komon-console/drafts.sqlite")
}

fn default_list_limit() -> u32 {
    50
}

fn default_contacts_page_size() -> u32 {
    20
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(raw)?;
        if !crate::api::is_webapp_page_url(&config.webapp_url) {
            return Err(ConfigError::WebappUrl(config.webapp_url));
        }
        config.api_base = match crate::api::api_base_from_page_url(&config.webapp_url) {
            Some(api_base) => api_base,
            None => return Err(ConfigError::WebappUrl(config.webapp_url)),
        };
        // 0 ломает пагинацию и limit>=1 на стороне API
        config.list_limit = config.list_limit.clamp(1, 100);
        config.contacts_page_size = config.contacts_page_size.clamp(1, 100);
        Ok(config)
    }

    /// Токен из окружения имеет приоритет над файлом.
    pub fn bot_token(&self) -> Result<String, ConfigError> {
        std::env::var(TOKEN_ENV)
            .ok()
            .or_else(|| self.bot_token.clone())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = Config::parse(r#"webapp_url = "https://komon.tot.pub/bot/webapp/""#)
            .expect("config parses");
        assert_eq!(config.list_limit, 50);
        assert_eq!(config.contacts_page_size, 20);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.api_base(), "https://komon.tot.pub/bot/api");
    }

    #[test]
    fn clamps_page_sizes_to_api_limits() {
        let config = Config::parse(
            r#"
            webapp_url = "https://h/bot/webapp"
            list_limit = 0
            contacts_page_size = 500
            "#,
        )
        .expect("config parses");
        assert_eq!(config.list_limit, 1);
        assert_eq!(config.contacts_page_size, 100);
    }

    #[test]
    fn rejects_page_url_without_webapp_segment() {
        let err = Config::parse(r#"webapp_url = "https://h/bot/""#).unwrap_err();
        assert!(matches!(err, ConfigError::WebappUrl(_)));
    }

    #[test]
    fn webapp_only_in_host_name_is_rejected() {
        let err = Config::parse(r#"webapp_url = "https://webapp.komon.pub/bot/""#).unwrap_err();
        assert!(matches!(err, ConfigError::WebappUrl(_)));

        let config = Config::parse(r#"webapp_url = "https://webapp.komon.pub/bot/webapp/""#)
            .expect("config parses");
        assert_eq!(config.api_base(), "https://webapp.komon.pub/bot/api");
    }

    #[test]
    fn relative_page_url_is_rejected() {
        let err = Config::parse(r#"webapp_url = "/bot/webapp/""#).unwrap_err();
        assert!(matches!(err, ConfigError::WebappUrl(_)));
    }
}
