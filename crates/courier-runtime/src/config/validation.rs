//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, CourierConfig, FetchRetryConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the bot section.
pub fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.token.is_empty() {
        return Err(ConfigError::missing_field("bot.token"));
    }
    if bot.token.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation("Bot token must not contain whitespace"));
    }

    validate_url(&bot.api_url)?;

    if bot.workers == 0 {
        return Err(ConfigError::validation("At least one worker is required"));
    }

    if let Some(limit) = bot.poll_limit
        && !(1..=100).contains(&limit)
    {
        return Err(ConfigError::validation(format!(
            "Poll limit must be between 1 and 100, got {limit}"
        )));
    }

    if bot.request_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "Request timeout must be greater than 0",
        ));
    }

    validate_retry_config(&bot.fetch_retry)?;

    Ok(())
}

/// Validates retry configuration.
fn validate_retry_config(retry: &FetchRetryConfig) -> ConfigResult<()> {
    if retry.initial_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Initial retry delay must be greater than 0",
        ));
    }

    if retry.max_delay_ms < retry.initial_delay_ms {
        return Err(ConfigError::validation(
            "Max retry delay must be greater than or equal to initial delay",
        ));
    }

    if retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Backoff multiplier must be at least 1.0",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates a URL format.
fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::invalid_url(url, "URL cannot be empty"));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::invalid_url(
            url,
            "URL must start with http:// or https://",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CourierConfig {
        CourierConfig {
            bot: BotConfig::with_token("123:abc"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let err = validate_config(&CourierConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "bot.token"));
    }

    #[test]
    fn test_token_with_whitespace() {
        let mut config = valid();
        config.bot.token = "123 abc".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_zero_workers() {
        let mut config = valid();
        config.bot.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_poll_limit_range() {
        let mut config = valid();
        config.bot.poll_limit = Some(0);
        assert!(validate_config(&config).is_err());
        config.bot.poll_limit = Some(101);
        assert!(validate_config(&config).is_err());
        config.bot.poll_limit = Some(100);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_api_url() {
        let mut config = valid();
        config.bot.api_url = "api.telegram.org".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_invalid_retry() {
        let mut config = valid();
        config.bot.fetch_retry.max_delay_ms = 10;
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.bot.fetch_retry.backoff_multiplier = 0.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
        config.logging.file_path = Some("courier.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
