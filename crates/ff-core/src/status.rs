//! User presence status and the UI shell that displays it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Presence classification pushed to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Idle,
}

impl Status {
    /// The label the UI shell shows for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Idle => "Idle",
        }
    }

    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Idle" => Ok(Self::Idle),
            _ => Err(ValidationError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// The UI surface the coordinator drives.
///
/// Calls arrive on the coordinator task and must return promptly; a shell
/// that needs to do real work should hand it off to its own task.
pub trait Shell: Send + Sync {
    /// The session switched between `Active` and `Idle`.
    fn status_changed(&self, status: Status);

    /// Cover the screen with the idle overlay.
    fn show_idle_overlay(&self);

    /// Remove the idle overlay.
    fn hide_idle_overlay(&self);
}
