//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Shortest reply body we still consider useful, on top of the address.
const MIN_REPLY_LENGTH: usize = 40;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Credentials are only needed when talking to Twitter
    if config.bot.fixtures.is_none() {
        let credentials = [
            ("twitter.consumer_key", &config.twitter.consumer_key),
            ("twitter.consumer_secret", &config.twitter.consumer_secret),
            ("twitter.access_token", &config.twitter.access_token),
            ("twitter.access_token_secret", &config.twitter.access_token_secret),
        ];
        for (field, value) in credentials {
            if value.is_empty() {
                errors.push(format!("{} is required", field));
            }
        }
        if config.twitter.api_base.is_empty() {
            errors.push("twitter.api_base is required".to_string());
        }
    }

    if let Some(ref handle) = config.bot.handle {
        if !is_valid_handle(handle) {
            errors.push(format!(
                "bot.handle '{}' must be 1-15 letters, digits or underscores",
                handle
            ));
        }
    }

    if config.bot.poll_interval_secs == 0 {
        errors.push("bot.poll_interval_secs must be non-zero".to_string());
    }
    if config.bot.rate_limit_cooldown_secs == 0 {
        errors.push("bot.rate_limit_cooldown_secs must be non-zero".to_string());
    }
    if config.bot.request_timeout_secs == 0 {
        errors.push("bot.request_timeout_secs must be non-zero".to_string());
    }

    if let Some(ref base_url) = config.registry.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            errors.push(format!(
                "registry.base_url '{}' must start with http:// or https://",
                base_url
            ));
        }
    }

    if config.replies.max_length < MIN_REPLY_LENGTH {
        errors.push(format!(
            "replies.max_length must be at least {} (got {})",
            MIN_REPLY_LENGTH, config.replies.max_length
        ));
    }
    if !config.replies.detail_url.contains("{regno}") {
        errors.push("replies.detail_url must contain {regno}".to_string());
    }
    if let Some(ref search_url) = config.replies.search_url {
        if !search_url.contains("{query}") {
            errors.push("replies.search_url must contain {query}".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

/// Twitter handles: 1-15 characters of `[A-Za-z0-9_]`, optional leading `@`.
pub fn is_valid_handle(handle: &str) -> bool {
    let handle = handle.trim_start_matches('@');
    !handle.is_empty()
        && handle.len() <= 15
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_config() -> Config {
        let mut config = Config::default();
        config.twitter.consumer_key = "ck".to_string();
        config.twitter.consumer_secret = "cs".to_string();
        config.twitter.access_token = "at".to_string();
        config.twitter.access_token_secret = "ats".to_string();
        config.bot.handle = Some("CharityRandom".to_string());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_credentials_fail() {
        let mut config = make_valid_config();
        config.twitter.consumer_secret = String::new();
        config.twitter.access_token = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("twitter.consumer_secret"));
        assert!(message.contains("twitter.access_token"));
    }

    #[test]
    fn test_fixtures_do_not_need_credentials() {
        let mut config = Config::default();
        config.bot.fixtures = Some("mentions.json".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_handle_fails() {
        let mut config = make_valid_config();
        config.bot.handle = Some("not a handle".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("bot.handle"));
    }

    #[test]
    fn test_zero_interval_fails() {
        let mut config = make_valid_config();
        config.bot.poll_interval_secs = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_templates_need_placeholders() {
        let mut config = make_valid_config();
        config.replies.detail_url = "http://example.org/charity".to_string();
        config.replies.search_url = Some("http://example.org/search".to_string());

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("{regno}"));
        assert!(message.contains("{query}"));
    }

    #[test]
    fn test_is_valid_handle() {
        assert!(is_valid_handle("CharityRandom"));
        assert!(is_valid_handle("@charity_random"));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("way_too_long_for_twitter"));
        assert!(!is_valid_handle("has-dash"));
    }
}
