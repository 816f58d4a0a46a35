//! Canonical application identifiers

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static APP_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^application_(\d+)_(\d+)$").expect("valid application id pattern"));

/// Identifier of a running application, unique per cluster.
///
/// The canonical textual form is `application_<cluster_timestamp>_<id>`,
/// which is also how the identifier appears in storage paths and request
/// routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId {
    /// Start timestamp of the cluster that issued the id
    pub cluster_timestamp: u64,
    /// Sequence number within the cluster
    pub id: u32,
}

impl ApplicationId {
    /// Creates a new application id
    pub fn new(cluster_timestamp: u64, id: u32) -> Self {
        Self {
            cluster_timestamp,
            id,
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "application_{}_{}", self.cluster_timestamp, self.id)
    }
}

/// Error returned when parsing a malformed application id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseApplicationIdError(String);

impl fmt::Display for ParseApplicationIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid application id: {}", self.0)
    }
}

impl std::error::Error for ParseApplicationIdError {}

impl FromStr for ApplicationId {
    type Err = ParseApplicationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = APP_ID_PATTERN
            .captures(s)
            .ok_or_else(|| ParseApplicationIdError(s.to_string()))?;
        let cluster_timestamp = captures[1]
            .parse::<u64>()
            .map_err(|_| ParseApplicationIdError(s.to_string()))?;
        let id = captures[2]
            .parse::<u32>()
            .map_err(|_| ParseApplicationIdError(s.to_string()))?;
        Ok(Self {
            cluster_timestamp,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let app_id = ApplicationId::new(0, 1);
        assert_eq!(app_id.to_string(), "application_0_1");
        assert_eq!("application_0_1".parse::<ApplicationId>().unwrap(), app_id);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("app_0_1".parse::<ApplicationId>().is_err());
        assert!("application_x_1".parse::<ApplicationId>().is_err());
        assert!("application_0".parse::<ApplicationId>().is_err());
    }

    #[test]
    fn test_ordering() {
        let earlier = ApplicationId::new(0, 1);
        let later = ApplicationId::new(0, 2);
        assert!(earlier < later);
    }
}
