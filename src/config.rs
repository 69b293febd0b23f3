//! Desk configuration from the environment.
//!
//! `API_URL` (backend base URL), `PORT`, `HEALTH_POLL_INTERVAL_MS`, `REQUEST_TIMEOUT_SECS`,
//! `ORDER_HISTORY_LIMIT` and `AMOUNT_LIMIT_POLICY` (`warn` | `block`). Unset or
//! unparseable values fall back to the defaults.

use std::time::Duration;

use log::warn;

use crate::health::DEFAULT_POLL_INTERVAL;
use crate::order_builder::AmountLimitPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ORDER_HISTORY_LIMIT: u32 = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct DeskConfig {
    pub api_url: String,
    pub port: u16,
    pub health_poll_interval: Duration,
    pub request_timeout: Duration,
    pub order_history_limit: u32,
    pub amount_policy: AmountLimitPolicy,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            port: DEFAULT_PORT,
            health_poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            order_history_limit: DEFAULT_ORDER_HISTORY_LIMIT,
            amount_policy: AmountLimitPolicy::default(),
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. For tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_url = lookup("API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.api_url);
        let port = lookup("PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let health_poll_interval = lookup("HEALTH_POLL_INTERVAL_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.health_poll_interval);
        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let order_history_limit = lookup("ORDER_HISTORY_LIMIT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.order_history_limit);
        let amount_policy = match lookup("AMOUNT_LIMIT_POLICY") {
            Some(s) => s.trim().parse::<AmountLimitPolicy>().unwrap_or_else(|e| {
                warn!("AMOUNT_LIMIT_POLICY: {}; using warn", e);
                AmountLimitPolicy::Warn
            }),
            None => defaults.amount_policy,
        };
        Self {
            api_url,
            port,
            health_poll_interval,
            request_timeout,
            order_history_limit,
            amount_policy,
        }
    }
}
