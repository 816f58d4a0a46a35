//! Delegation token lifecycle configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Intervals governing the delegation token lifecycle.
///
/// All four durations are required when the token manager service is
/// constructed. Defaults follow the usual production values: daily key
/// rotation and renewal, a seven day maximum lifetime, and an hourly
/// removal scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    /// How often the signing key ring rotates in a fresh master key
    #[serde(with = "duration_millis")]
    pub secret_key_interval: Duration,

    /// Absolute lifetime past which a token cannot be renewed, only replaced
    #[serde(with = "duration_millis")]
    pub token_max_lifetime: Duration,

    /// How far a successful renewal pushes out the current expiry, and how
    /// often each collector schedules its renewal tick
    #[serde(with = "duration_millis")]
    pub token_renew_interval: Duration,

    /// How often the background scan removes tokens past their max lifetime
    #[serde(with = "duration_millis")]
    pub token_removal_scan_interval: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_key_interval: Duration::from_secs(24 * 60 * 60),
            token_max_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
            token_renew_interval: Duration::from_secs(24 * 60 * 60),
            token_removal_scan_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl TokenConfig {
    /// Creates a configuration from raw millisecond values, as supplied by
    /// environment variables or an external configuration file.
    pub fn from_millis(
        secret_key_interval: u64,
        token_max_lifetime: u64,
        token_renew_interval: u64,
        token_removal_scan_interval: u64,
    ) -> Self {
        Self {
            secret_key_interval: Duration::from_millis(secret_key_interval),
            token_max_lifetime: Duration::from_millis(token_max_lifetime),
            token_renew_interval: Duration::from_millis(token_renew_interval),
            token_removal_scan_interval: Duration::from_millis(token_removal_scan_interval),
        }
    }

    /// Loads overrides from `TIMELINE_TOKEN_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            secret_key_interval: env_millis("TIMELINE_TOKEN_SECRET_KEY_INTERVAL_MS")
                .unwrap_or(default.secret_key_interval),
            token_max_lifetime: env_millis("TIMELINE_TOKEN_MAX_LIFETIME_MS")
                .unwrap_or(default.token_max_lifetime),
            token_renew_interval: env_millis("TIMELINE_TOKEN_RENEW_INTERVAL_MS")
                .unwrap_or(default.token_renew_interval),
            token_removal_scan_interval: env_millis("TIMELINE_TOKEN_REMOVAL_SCAN_INTERVAL_MS")
                .unwrap_or(default.token_removal_scan_interval),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenConfig::default();
        assert_eq!(config.token_renew_interval, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.token_max_lifetime, Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn test_from_millis() {
        let config = TokenConfig::from_millis(1000, 4000, 100, 2000);
        assert_eq!(config.secret_key_interval, Duration::from_millis(1000));
        assert_eq!(config.token_max_lifetime, Duration::from_millis(4000));
        assert_eq!(config.token_renew_interval, Duration::from_millis(100));
        assert_eq!(config.token_removal_scan_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = TokenConfig::from_millis(1000, 4000, 100, 2000);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TokenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
