//! Broker configuration.

use core_config::{env_or_default, ConfigError};
use retry::RetryConfig;
use std::time::Duration;

/// Connection and subscription settings for the event log.
///
/// Loaded from the environment:
/// - `NATS_URL` (default `nats://localhost:4222`)
/// - `EVENT_STREAM` (default `NOTIFICATIONS`)
/// - `EVENT_SUBJECT` — the topic (default `notifications`)
/// - `CONSUMER_GROUP` (default `notification-service-group`)
/// - `BROKER_CONNECT_ATTEMPTS` / `BROKER_CONNECT_DELAY_SECS` — bounded-retry
///   profile; defaults differ per side (publisher 3×5s, consumer 10×3s).
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub consumer_group: String,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
}

impl BrokerConfig {
    /// Load with the publisher's connect profile (3 attempts, 5s apart).
    pub fn publisher_from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_profile(3, 5)
    }

    /// Load with the ingestion loop's connect profile (10 attempts, 3s apart).
    pub fn consumer_from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_profile(10, 3)
    }

    fn from_env_with_profile(
        default_attempts: u32,
        default_delay_secs: u64,
    ) -> Result<Self, ConfigError> {
        let connect_attempts = env_or_default(
            "BROKER_CONNECT_ATTEMPTS",
            &default_attempts.to_string(),
        )
        .parse()
        .map_err(|e| ConfigError::ParseError {
            key: "BROKER_CONNECT_ATTEMPTS".to_string(),
            details: format!("{}", e),
        })?;

        let delay_secs: u64 = env_or_default(
            "BROKER_CONNECT_DELAY_SECS",
            &default_delay_secs.to_string(),
        )
        .parse()
        .map_err(|e| ConfigError::ParseError {
            key: "BROKER_CONNECT_DELAY_SECS".to_string(),
            details: format!("{}", e),
        })?;

        Ok(Self {
            url: env_or_default("NATS_URL", "nats://localhost:4222"),
            stream: env_or_default("EVENT_STREAM", "NOTIFICATIONS"),
            subject: env_or_default("EVENT_SUBJECT", "notifications"),
            consumer_group: env_or_default("CONSUMER_GROUP", "notification-service-group"),
            connect_attempts,
            connect_delay: Duration::from_secs(delay_secs),
        })
    }

    /// The bounded fixed-delay retry profile for connection attempts.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(self.connect_attempts, self.connect_delay.as_millis() as u64)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            stream: "NOTIFICATIONS".to_string(),
            subject: "notifications".to_string(),
            consumer_group: "notification-service-group".to_string(),
            connect_attempts: 3,
            connect_delay: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_profile_defaults() {
        temp_env::with_vars(
            [
                ("NATS_URL", None::<&str>),
                ("BROKER_CONNECT_ATTEMPTS", None),
                ("BROKER_CONNECT_DELAY_SECS", None),
            ],
            || {
                let config = BrokerConfig::publisher_from_env().unwrap();
                assert_eq!(config.url, "nats://localhost:4222");
                assert_eq!(config.connect_attempts, 3);
                assert_eq!(config.connect_delay, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_consumer_profile_defaults() {
        temp_env::with_vars(
            [
                ("BROKER_CONNECT_ATTEMPTS", None::<&str>),
                ("BROKER_CONNECT_DELAY_SECS", None),
                ("CONSUMER_GROUP", None),
            ],
            || {
                let config = BrokerConfig::consumer_from_env().unwrap();
                assert_eq!(config.connect_attempts, 10);
                assert_eq!(config.connect_delay, Duration::from_secs(3));
                assert_eq!(config.consumer_group, "notification-service-group");
            },
        );
    }

    #[test]
    fn test_env_overrides_profile() {
        temp_env::with_vars(
            [
                ("BROKER_CONNECT_ATTEMPTS", Some("7")),
                ("BROKER_CONNECT_DELAY_SECS", Some("1")),
                ("EVENT_SUBJECT", Some("audit")),
            ],
            || {
                let config = BrokerConfig::publisher_from_env().unwrap();
                assert_eq!(config.connect_attempts, 7);
                assert_eq!(config.connect_delay, Duration::from_secs(1));
                assert_eq!(config.subject, "audit");
            },
        );
    }

    #[test]
    fn test_invalid_attempts_rejected() {
        temp_env::with_var("BROKER_CONNECT_ATTEMPTS", Some("lots"), || {
            let err = BrokerConfig::publisher_from_env().unwrap_err();
            assert!(err.to_string().contains("BROKER_CONNECT_ATTEMPTS"));
        });
    }

    #[test]
    fn test_retry_config_is_fixed_profile() {
        let config = BrokerConfig::default();
        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay_ms, 5000);
        assert_eq!(retry.backoff_multiplier, 1.0);
    }
}
