//! Environment-sourced configuration
//!
//! All settings are collected once at startup into a [`Config`] that is
//! passed by `Arc` to every component. Required variables fail fast with a
//! descriptive error instead of surfacing later as a broken request.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// DEFAULTS
// ============================================================================

const DEFAULT_METADATA_BASE_URL: &str = "https://www.bearish.af/api/metadata/bearish";
const DEFAULT_RESERVOIR_API_URL: &str = "https://api-abstract.reservoir.tools/tokens/v7";
const DEFAULT_CONTRACT_ADDRESS: &str = "0x516dc288e26b34557f68ea1c1ff13576eff8a168";
const DEFAULT_COLLECTION_SLUG: &str = "bearish";
const DEFAULT_WATCHLIST_PATH: &str = "unrevealed_tokens.json";
const DEFAULT_IMAGES_DIR: &str = "images";
const DEFAULT_BRAND_IMAGE_URL: &str =
    "https://www.bearish.af/_next/image?url=%2Fimages%2FLogo-Bearish-3D.png&w=640&q=75";
const DEFAULT_COLLECTION_SITE_URL: &str = "https://bearish.af";
const DEFAULT_COLLECTION_TWITTER_URL: &str = "https://twitter.com/bearish_af";

/// Seconds between polling passes (6 minutes)
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 360;

/// Seconds between watch-list load retries at startup
const DEFAULT_WATCHLIST_RETRY_SECS: u64 = 10;

/// Per-request HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    /// Reservoir API credential (rarity source)
    pub reservoir_api_key: String,
    /// Telegram bot token
    pub bot_token: String,
    /// The single chat all commands and announcements are scoped to
    pub chat_id: i64,

    /// Primary metadata endpoint, `GET {base}/{token_id}`
    pub metadata_base_url: String,
    /// Secondary rarity endpoint
    pub reservoir_api_url: String,
    /// Collection contract address, interpolated into rarity queries and links
    pub contract_address: String,
    /// Collection slug used in marketplace deep links
    pub collection_slug: String,
    /// Fallback brand image when no animation or final image is available
    pub brand_image_url: String,
    /// Collection website, linked from the startup summary
    pub collection_site_url: String,
    /// Collection Twitter profile, linked from the startup summary
    pub collection_twitter_url: String,

    /// Persisted watch-list file (JSON array of token ids)
    pub watchlist_path: PathBuf,
    /// Directory holding the local placeholder frames
    pub images_dir: PathBuf,

    /// Sleep between polling passes
    pub check_interval: Duration,
    /// Delay between watch-list load retries at startup
    pub watchlist_retry_delay: Duration,
    /// Maximum load attempts before giving up; `None` retries forever
    pub watchlist_max_retries: Option<u32>,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Call after `dotenv()`. Returns an error naming the first missing or
    /// unparseable variable.
    pub fn from_env() -> Result<Self> {
        let chat_id_raw = required("TELEGRAM_CHAT_ID")?;
        let chat_id: i64 = chat_id_raw
            .parse()
            .with_context(|| format!("TELEGRAM_CHAT_ID is not a valid chat id: '{}'", chat_id_raw))?;

        Ok(Self {
            reservoir_api_key: required("RESERVOIR_API_KEY")?,
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id,
            metadata_base_url: optional("METADATA_BASE_URL", DEFAULT_METADATA_BASE_URL),
            reservoir_api_url: optional("RESERVOIR_API_URL", DEFAULT_RESERVOIR_API_URL),
            contract_address: optional("CONTRACT_ADDRESS", DEFAULT_CONTRACT_ADDRESS),
            collection_slug: optional("COLLECTION_SLUG", DEFAULT_COLLECTION_SLUG),
            brand_image_url: optional("BRAND_IMAGE_URL", DEFAULT_BRAND_IMAGE_URL),
            collection_site_url: optional("COLLECTION_SITE_URL", DEFAULT_COLLECTION_SITE_URL),
            collection_twitter_url: optional(
                "COLLECTION_TWITTER_URL",
                DEFAULT_COLLECTION_TWITTER_URL,
            ),
            watchlist_path: PathBuf::from(optional("WATCHLIST_PATH", DEFAULT_WATCHLIST_PATH)),
            images_dir: PathBuf::from(optional("IMAGES_DIR", DEFAULT_IMAGES_DIR)),
            check_interval: Duration::from_secs(optional_u64(
                "CHECK_INTERVAL_SECS",
                DEFAULT_CHECK_INTERVAL_SECS,
            )?),
            watchlist_retry_delay: Duration::from_secs(optional_u64(
                "WATCHLIST_RETRY_SECS",
                DEFAULT_WATCHLIST_RETRY_SECS,
            )?),
            watchlist_max_retries: optional_parsed("WATCHLIST_MAX_RETRIES")?,
            http_timeout: Duration::from_secs(optional_u64(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} is required (set it in the environment or a .env file)", name),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value)),
        _ => Ok(default),
    }
}

fn optional_parsed(name: &str) -> Result<Option<u32>> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = value
                .parse()
                .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_names_the_variable() {
        env::remove_var("TELEGRAM_CHAT_ID");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_CHAT_ID"));
    }
}
