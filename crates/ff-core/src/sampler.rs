//! Desktop sampling capabilities.

use thiserror::Error;

/// The foreground window at the moment of a focus query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveWindow {
    pub app_name: String,
    pub window_title: String,
}

/// A failed desktop query.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// The windowing system could not be reached.
    #[error("display unavailable: {0}")]
    Unavailable(String),
    /// A query against a reachable display failed.
    #[error("query failed: {0}")]
    Query(String),
}

/// Reports which application and window currently have focus.
pub trait FocusSampler: Send + Sync {
    /// Returns `Ok(None)` when nothing has focus (e.g. an empty desktop).
    fn active_window(&self) -> Result<Option<ActiveWindow>, SamplerError>;
}

/// Reports how long the user has been away from the keyboard and mouse.
pub trait IdleSampler: Send + Sync {
    /// Whole seconds since the last input event.
    fn idle_seconds(&self) -> Result<u64, SamplerError>;
}
