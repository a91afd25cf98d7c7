use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::util::{is_local_endpoint_url, parse_bool_flag};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TYPING_DELAY_MS: u64 = 10;

const BACKEND_URL_ENV: &str = "AIDA_URL";
const TYPING_DELAY_ENV: &str = "AIDA_TYPING_DELAY_MS";
const BOOT_SEQUENCE_ENV: &str = "AIDA_BOOT_SEQUENCE";
const LOG_PATH_ENV: &str = "AIDA_LOG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend_url: String,
    pub typing_delay_ms: u64,
    pub boot_sequence: bool,
    pub log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            typing_delay_ms: DEFAULT_TYPING_DELAY_MS,
            boot_sequence: true,
            log_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let typing_delay_ms = match std::env::var(TYPING_DELAY_ENV) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => ms,
                Err(_) => bail!("Invalid {TYPING_DELAY_ENV} '{raw}': expected milliseconds"),
            },
            Err(_) => DEFAULT_TYPING_DELAY_MS,
        };
        let boot_sequence = std::env::var(BOOT_SEQUENCE_ENV)
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(true);
        let log_path = std::env::var(LOG_PATH_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            backend_url,
            typing_delay_ms,
            boot_sequence,
            log_path,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            bail!(
                "Invalid {BACKEND_URL_ENV} '{}': expected http:// or https:// URL",
                self.backend_url
            );
        }

        if !self.is_local_backend() {
            tracing::warn!(url = %self.backend_url, "backend is not on this machine");
        }

        Ok(())
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn is_local_backend(&self) -> bool {
        is_local_endpoint_url(&self.backend_url)
    }
}
