//! Loadable retry settings.
//!
//! With the `serde` feature, [`RetrySettings`] and
//! [`BackoffConfig`](super::BackoffConfig) (de)serialize with durations as
//! integer milliseconds:
//!
//! ```json
//! {
//!   "timeout_ms": 2000,
//!   "max_retries": 3,
//!   "backoff": { "base_delay_ms": 100, "exponential": true, "jitter": true }
//! }
//! ```

use std::time::Duration;

use super::backoff::BackoffConfig;

/// The data-only part of an [`ExecutionConfig`](super::ExecutionConfig).
///
/// Hooks, jitter sources and custom timeout errors can't be loaded from
/// configuration files; everything else can.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetrySettings {
    /// Per-attempt timeout.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "timeout_ms",
            with = "millis",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub timeout: Option<Duration>,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: BackoffConfig,
}

#[cfg(feature = "serde")]
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
