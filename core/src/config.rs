//! Client configuration: credentials, endpoint and channel header.

use std::env;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.voucherify.io/v1";
pub const DEFAULT_CHANNEL: &str = "Rust-SDK";

pub const ENV_APP_ID: &str = "VOUCHERIFY_APP_ID";
pub const ENV_APP_TOKEN: &str = "VOUCHERIFY_APP_TOKEN";
pub const ENV_API_URL: &str = "VOUCHERIFY_API_URL";
pub const ENV_CHANNEL: &str = "VOUCHERIFY_CHANNEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("base URL cannot carry path segments: {0}")]
    BaseUrlCannotBeABase(String),
}

/// Application credentials sent as `X-App-Id` / `X-App-Token`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_token: SecretString,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_token: SecretString::from(app_token.into()),
        }
    }

    pub(crate) fn token(&self) -> &str {
        self.app_token.expose_secret()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    /// Value of the `X-Voucherify-Channel` header.
    pub channel: String,
}

impl ClientConfig {
    pub fn new(app_id: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            credentials: Credentials::new(app_id, app_token),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    /// Point the client at another deployment (or a local mock).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Read credentials (and optionally endpoint and channel) from the
    /// `VOUCHERIFY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let app_id = lookup(ENV_APP_ID).ok_or(ConfigError::MissingEnv(ENV_APP_ID))?;
        let app_token = lookup(ENV_APP_TOKEN).ok_or(ConfigError::MissingEnv(ENV_APP_TOKEN))?;
        let mut config = Self::new(app_id, app_token);
        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_base_url(&url)?;
        }
        if let Some(channel) = lookup(ENV_CHANNEL) {
            config = config.with_channel(channel);
        }
        Ok(config)
    }
}

fn default_base_url() -> Url {
    match Url::parse(DEFAULT_BASE_URL) {
        Ok(url) => url,
        Err(e) => unreachable!("default base URL is valid: {e}"),
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim_end_matches('/'))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::BaseUrlCannotBeABase(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_public_api() {
        let config = ClientConfig::new("id", "token");
        assert_eq!(config.base_url.as_str(), "https://api.voucherify.io/v1");
        assert_eq!(config.channel, "Rust-SDK");
        assert_eq!(config.credentials.token(), "token");
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let config = ClientConfig::new("id", "token")
            .with_base_url("http://localhost:3000/v1/")
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/v1");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        let err = ClientConfig::new("id", "token").with_base_url("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let err = ClientConfig::new("id", "token").with_base_url("mailto:x@y.z").unwrap_err();
        assert!(matches!(err, ConfigError::BaseUrlCannotBeABase(_)));
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", ClientConfig::new("app-1", "s3cr3t"));
        assert!(rendered.contains("app-1"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn env_requires_both_credentials() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_APP_ID, "id")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ENV_APP_TOKEN)));

        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ENV_APP_ID)));
    }

    #[test]
    fn env_overrides_endpoint_and_channel() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_APP_ID, "id"),
            (ENV_APP_TOKEN, "token"),
            (ENV_API_URL, "http://127.0.0.1:8080/v1"),
            (ENV_CHANNEL, "Batch-Job"),
        ]))
        .unwrap();
        assert_eq!(config.credentials.app_id, "id");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/v1");
        assert_eq!(config.channel, "Batch-Job");
    }
}
