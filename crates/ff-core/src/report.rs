//! Telemetry reports and the sink that delivers them.

use serde::Serialize;

use crate::sampler::ActiveWindow;
use crate::types::UserId;

/// Application name carried by the synthetic report sent when the user goes idle.
pub const IDLE_APPLICATION_NAME: &str = "System";

/// Window title carried by the synthetic report sent when the user goes idle.
pub const IDLE_WINDOW_TITLE: &str = "User Idle";

/// One activity sample, built per tick and sent once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub user_id: UserId,
    pub application_name: String,
    pub window_title: String,
    pub is_idle: bool,
}

impl Report {
    /// A sample of the focused window while the user is active.
    pub fn activity(user_id: UserId, window: ActiveWindow) -> Self {
        Self {
            user_id,
            application_name: window.app_name,
            window_title: window.window_title,
            is_idle: false,
        }
    }

    /// The marker sent once when the user crosses the idle threshold.
    pub fn idle(user_id: UserId) -> Self {
        Self {
            user_id,
            application_name: IDLE_APPLICATION_NAME.to_string(),
            window_title: IDLE_WINDOW_TITLE.to_string(),
            is_idle: true,
        }
    }

    /// The form body accepted by the telemetry endpoint.
    pub fn form(&self) -> ReportForm<'_> {
        ReportForm {
            user_id: self.user_id.as_str(),
            application_name: &self.application_name,
            window_title: &self.window_title,
            is_idle: u8::from(self.is_idle),
        }
    }
}

/// Wire shape of a [`Report`]: `user_id`, `application_name`, `window_title`,
/// and `is_idle` as `0`/`1`, in that order.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportForm<'a> {
    pub user_id: &'a str,
    pub application_name: &'a str,
    pub window_title: &'a str,
    pub is_idle: u8,
}

/// Destination for reports.
///
/// `submit` must not block: implementations dispatch the report in the
/// background and log the outcome. Nothing is retried, queued, or batched,
/// and a report still in flight when the process exits is lost.
pub trait TelemetrySink: Send + Sync {
    fn submit(&self, report: Report);
}
