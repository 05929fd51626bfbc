//! Staging configuration
//!
//! # Environment Variables
//!
//! - `CATALOG_ORPHAN_VALUES`: `reject` (default) or `stage`
//! - `CATALOG_SUBMIT_TIMEOUT_MS`: batch submission timeout in milliseconds
//!   (unset means wait indefinitely)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// What to do with a value CREATE whose owning label is not in the hierarchy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanValuePolicy {
    /// Refuse the operation; nothing is staged
    #[default]
    Reject,
    /// Record the operation in the log with no hierarchy effect
    Stage,
}

impl OrphanValuePolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "stage" => Some(Self::Stage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StagingConfig {
    pub orphan_values: OrphanValuePolicy,

    /// Upper bound on a batch submission; `None` waits indefinitely
    #[serde(with = "optional_millis")]
    pub submit_timeout: Option<Duration>,
}

impl StagingConfig {
    /// Configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("CATALOG_ORPHAN_VALUES") {
            match OrphanValuePolicy::parse(&raw) {
                Some(policy) => config.orphan_values = policy,
                None => tracing::warn!(
                    "Ignoring CATALOG_ORPHAN_VALUES='{}' (expected 'reject' or 'stage')",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("CATALOG_SUBMIT_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.submit_timeout = Some(Duration::from_millis(ms)),
                Err(_) => tracing::warn!("Ignoring CATALOG_SUBMIT_TIMEOUT_MS='{}'", raw),
            }
        }

        config
    }

    pub fn with_orphan_values(mut self, policy: OrphanValuePolicy) -> Self {
        self.orphan_values = policy;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
