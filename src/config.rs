//! Process configuration loaded from the environment.
//!
//! DESIGN
//! ======
//! Everything is read once at startup into `Config`. Only `DATABASE_URL` is
//! required; every other knob falls back to a default through `env_parse`.
//! Email delivery is optional: without `RESEND_API_KEY` and `RESEND_FROM`
//! the server still runs but access-code sign-in answers 503.

use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EDITOR_IDLE_SECS: u64 = 1800;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
}

/// Resend credentials for access-code emails.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub cookie_secure: bool,
    pub mailer: Option<MailerConfig>,
    /// Idle editing sessions with nothing unsaved are evicted after this long.
    pub editor_idle: Duration,
}

impl Config {
    /// # Errors
    ///
    /// Returns `Missing` when `DATABASE_URL` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env_string("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        Ok(Self {
            database_url,
            port: env_parse("PORT", DEFAULT_PORT),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
            mailer: mailer_from_env(),
            editor_idle: Duration::from_secs(env_parse("EDITOR_IDLE_SECS", DEFAULT_EDITOR_IDLE_SECS)),
        })
    }
}

fn mailer_from_env() -> Option<MailerConfig> {
    let api_key = env_string("RESEND_API_KEY")?;
    let from = env_string("RESEND_FROM")?;
    Some(MailerConfig { api_key, from })
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
