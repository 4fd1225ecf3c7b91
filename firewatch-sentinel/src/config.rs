//! Sentinel configuration
//!
//! Every tunable is an explicit value handed to the owning component at
//! construction; there is no process-wide mutable state. Resolution order
//! for the file itself follows firewatch-common: CLI → env → default path.
//! Individual credentials additionally accept `FIREWATCH_*` environment
//! overrides so deployments can keep secrets out of the TOML file.

use firewatch_common::config::env_value;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "FIREWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "firewatch.toml";

const ENV_FIRMS_API_KEY: &str = "FIREWATCH_FIRMS_API_KEY";
const ENV_TELEGRAM_BOT_TOKEN: &str = "FIREWATCH_TELEGRAM_BOT_TOKEN";
const ENV_TELEGRAM_CHAT_IDS: &str = "FIREWATCH_TELEGRAM_CHAT_IDS";

fn default_database_path() -> PathBuf {
    PathBuf::from("firewatch.db")
}

fn default_area_bbox() -> String {
    // west,south,east,north — the monitored country-scale box
    "68,6,98,38".to_string()
}

fn default_verify_min_frp() -> f64 {
    20.0
}

fn default_artifact_ceiling() -> f64 {
    300.0
}

fn default_alert_global_frp() -> f64 {
    50.0
}

fn default_alert_secondary_frp() -> f64 {
    25.0
}

fn default_feed_timeout() -> u64 {
    30
}

fn default_oracle_timeout() -> u64 {
    10
}

fn default_notify_timeout() -> u64 {
    5
}

/// Sentinel configuration, TOML-deserializable with per-field defaults so
/// a partial (or absent) file still yields a runnable configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// FIRMS area-API key; empty disables polar feed polling
    #[serde(default)]
    pub firms_api_key: String,

    /// Telegram bot token; empty downgrades the notifier to log-only
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Alert recipients; empty entries are filtered out at load
    #[serde(default)]
    pub telegram_chat_ids: Vec<String>,

    /// Feed query box, "west,south,east,north" in degrees
    #[serde(default = "default_area_bbox")]
    pub area_bbox: String,

    /// Tier-2 verification floor: outside the home zone, the oracle is
    /// only consulted at or above this intensity (MW)
    #[serde(default = "default_verify_min_frp")]
    pub verify_min_frp_mw: f64,

    /// Physical-plausibility ceiling (MW); hotter anomalies are rejected
    /// as sensor artifacts unless land use independently checks out
    #[serde(default = "default_artifact_ceiling")]
    pub artifact_ceiling_mw: f64,

    /// Escalate any new event at or above this intensity, regardless of zone
    #[serde(default = "default_alert_global_frp")]
    pub alert_global_frp_mw: f64,

    /// Escalation floor inside the secondary high-risk zone
    #[serde(default = "default_alert_secondary_frp")]
    pub alert_secondary_frp_mw: f64,

    #[serde(default = "default_feed_timeout")]
    pub feed_timeout_secs: u64,

    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,

    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        // serde defaults and Default must agree; route through an empty table
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl SentinelConfig {
    /// Apply `FIREWATCH_*` environment overrides on top of file values and
    /// drop blank recipient entries.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(key) = env_value(ENV_FIRMS_API_KEY) {
            self.firms_api_key = key;
        }
        if let Some(token) = env_value(ENV_TELEGRAM_BOT_TOKEN) {
            self.telegram_bot_token = token;
        }
        if let Some(ids) = env_value(ENV_TELEGRAM_CHAT_IDS) {
            self.telegram_chat_ids = ids.split(',').map(|s| s.trim().to_string()).collect();
        }

        self.telegram_chat_ids.retain(|id| !id.trim().is_empty());
        self
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}
