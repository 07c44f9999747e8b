use std::time::Duration;

use anyhow::{Context, Result};

const URL_ENV: &str = "BCAST_GATEWAY_URL";
const INSTANCE_ENV: &str = "BCAST_GATEWAY_INSTANCE";
const API_KEY_ENV: &str = "BCAST_GATEWAY_API_KEY";
const TIMEOUT_ENV: &str = "BCAST_GATEWAY_TIMEOUT_MS";

#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub instance: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("instance", &self.instance)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "mock://gateway".into(),
            instance: "default".into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        if let Some(url) = non_empty(URL_ENV) {
            cfg.base_url = url.trim().to_string();
        }
        if let Some(instance) = non_empty(INSTANCE_ENV) {
            cfg.instance = instance.trim().to_string();
        }
        cfg.api_key = non_empty(API_KEY_ENV);
        if let Some(ms) = non_empty(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.timeout = Duration::from_millis(ms);
        }
        cfg
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("build gateway http client")
    }
}
