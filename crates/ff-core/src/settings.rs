//! Session tracking settings and how they are resolved.
//!
//! The login response may carry per-user overrides; the settings service
//! supplies server-wide defaults. Each field is taken from the override when
//! present and from the defaults otherwise.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::types::ValidationError;

/// Timer configuration for one session. Immutable once the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Period of the activity sampler.
    pub sample_interval: Duration,
    /// Idle time at or beyond which the user counts as idle.
    pub idle_threshold: Duration,
}

impl TrackingConfig {
    /// Builds a config from whole seconds, rejecting zero periods.
    pub fn from_secs(
        sample_interval_secs: u64,
        idle_threshold_secs: u64,
    ) -> Result<Self, ValidationError> {
        if sample_interval_secs == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "tracking interval",
            });
        }
        if idle_threshold_secs == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "idle timeout",
            });
        }
        Ok(Self {
            sample_interval: Duration::from_secs(sample_interval_secs),
            idle_threshold: Duration::from_secs(idle_threshold_secs),
        })
    }

    /// Resolves each field from `overrides` first, then `defaults`.
    ///
    /// `defaults` is `None` when the settings service could not be reached;
    /// that only succeeds if the override covers every field.
    pub fn merge(
        overrides: SettingsOverride,
        defaults: Option<&DefaultSettings>,
    ) -> Result<Self, ValidationError> {
        let sample_interval_secs = overrides
            .tracking_interval_secs
            .or_else(|| defaults.map(|d| d.tracking_interval_seconds))
            .ok_or(ValidationError::MissingSetting {
                field: "tracking interval",
            })?;
        let idle_threshold_secs = overrides
            .idle_timeout_secs
            .or_else(|| defaults.map(|d| d.idle_timeout_seconds))
            .ok_or(ValidationError::MissingSetting {
                field: "idle timeout",
            })?;
        Self::from_secs(sample_interval_secs, idle_threshold_secs)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "configured intervals are far below u64::MAX milliseconds"
    )]
    pub const fn sample_interval_ms(&self) -> u64 {
        self.sample_interval.as_millis() as u64
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "configured thresholds are far below u64::MAX milliseconds"
    )]
    pub const fn idle_threshold_ms(&self) -> u64 {
        self.idle_threshold.as_millis() as u64
    }
}

/// Per-user settings carried in the login response.
///
/// A field that was absent, null, empty, zero, or not a number is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsOverride {
    #[serde(
        default,
        rename = "tracking_interval",
        deserialize_with = "deserialize_optional_seconds"
    )]
    pub tracking_interval_secs: Option<u64>,
    #[serde(
        default,
        rename = "idle_timeout",
        deserialize_with = "deserialize_optional_seconds"
    )]
    pub idle_timeout_secs: Option<u64>,
}

impl SettingsOverride {
    /// True when the defaults would not be consulted for any field.
    pub const fn is_complete(&self) -> bool {
        self.tracking_interval_secs.is_some() && self.idle_timeout_secs.is_some()
    }
}

/// Server-wide defaults from the settings service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DefaultSettings {
    #[serde(deserialize_with = "deserialize_seconds")]
    pub tracking_interval_seconds: u64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub idle_timeout_seconds: u64,
}

/// A seconds value as PHP backends tend to emit it: number or numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeconds {
    Whole(u64),
    Fractional(f64),
    Text(String),
}

impl RawSeconds {
    /// Leading-integer parse: `"10"` and `"10s"` give 10, `"1.5"` gives 1,
    /// anything without leading digits gives `None`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fractional seconds are truncated toward zero and negatives clamp to zero"
    )]
    fn whole_seconds(&self) -> Option<u64> {
        match self {
            Self::Whole(secs) => Some(*secs),
            Self::Fractional(secs) if secs.is_finite() => Some(secs.max(0.0) as u64),
            Self::Fractional(_) => None,
            Self::Text(text) => {
                let text = text.trim_start();
                let digits = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
                text[..digits].parse().ok()
            }
        }
    }
}

fn deserialize_optional_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSeconds>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(RawSeconds::whole_seconds)
        .filter(|secs| *secs > 0))
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawSeconds::deserialize(deserializer)?;
    raw.whole_seconds()
        .ok_or_else(|| serde::de::Error::custom("expected a whole number of seconds"))
}
