//! Bridge configuration from the process environment.
//!
//! | Variable | Default | Effect |
//! |----------|---------|--------|
//! | `PORT` | `3000` | HTTP port |
//! | `BRIDGE_HOST` | `0.0.0.0` | Bind address |
//! | `USE_HTTP` | enabled | Only the exact value `false` disables the HTTP transport |
//! | `BRIDGE_REQUEST_TIMEOUT_MS` | none | Deadline for each reply |
//! | `BRIDGE_DRAIN_TIMEOUT_MS` | none | Upper bound on shutdown drain |
//! | `BRIDGE_MAX_REQUEST_BYTES` | `1048576` | Request body limit |
//!
//! Values that fail to parse are logged and ignored.

use http_bridge::BridgeConfig;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Load bridge configuration from the process environment
pub fn load_config() -> BridgeConfig {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load bridge configuration from an arbitrary variable source
pub fn load_config_from<F>(lookup: F) -> BridgeConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BridgeConfig::default();

    if let Some(port) = parsed(&lookup, "PORT") {
        config.http.port = port;
    }
    if let Some(host) = parsed(&lookup, "BRIDGE_HOST") {
        config.http.host = host;
    }
    if let Some(flag) = lookup("USE_HTTP") {
        config.http.enabled = flag != "false";
    }
    if let Some(ms) = parsed::<u64, _>(&lookup, "BRIDGE_REQUEST_TIMEOUT_MS") {
        config.timeouts.request = Some(Duration::from_millis(ms));
    }
    if let Some(ms) = parsed::<u64, _>(&lookup, "BRIDGE_DRAIN_TIMEOUT_MS") {
        config.timeouts.drain = Some(Duration::from_millis(ms));
    }
    if let Some(bytes) = parsed(&lookup, "BRIDGE_MAX_REQUEST_BYTES") {
        config.limits.max_request_size = bytes;
    }

    config
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}
