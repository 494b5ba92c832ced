//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CHARITYBOT_CONSUMER_KEY` - Twitter consumer key
//! - `CHARITYBOT_CONSUMER_SECRET` - Twitter consumer secret
//! - `CHARITYBOT_ACCESS_TOKEN` - Twitter access token
//! - `CHARITYBOT_ACCESS_TOKEN_SECRET` - Twitter access token secret
//! - `CHARITYBOT_HANDLE` - Handle the bot answers to

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CHARITYBOT";

/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "charitybot.conf";

/// Apply environment variable overrides to a config.
///
/// This allows the Twitter secrets to be provided via environment
/// variables instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(value) = env::var(format!("{}_CONSUMER_KEY", ENV_PREFIX)) {
        config.twitter.consumer_key = value;
    }
    if let Ok(value) = env::var(format!("{}_CONSUMER_SECRET", ENV_PREFIX)) {
        config.twitter.consumer_secret = value;
    }
    if let Ok(value) = env::var(format!("{}_ACCESS_TOKEN", ENV_PREFIX)) {
        config.twitter.access_token = value;
    }
    if let Ok(value) = env::var(format!("{}_ACCESS_TOKEN_SECRET", ENV_PREFIX)) {
        config.twitter.access_token_secret = value;
    }

    if let Ok(handle) = env::var(format!("{}_HANDLE", ENV_PREFIX)) {
        if !handle.is_empty() {
            config.bot.handle = Some(handle);
        }
    }

    config
}

/// Check if any credential environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_CONSUMER_KEY", ENV_PREFIX),
        format!("{}_CONSUMER_SECRET", ENV_PREFIX),
        format!("{}_ACCESS_TOKEN", ENV_PREFIX),
        format!("{}_ACCESS_TOKEN_SECRET", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `CHARITYBOT_CONFIG` environment variable, otherwise returns
/// "charitybot.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
