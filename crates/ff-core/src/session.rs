//! The authenticated tracking session.

use crate::settings::TrackingConfig;
use crate::types::User;

/// Identity and settings for the one live session of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub config: TrackingConfig,
}

impl Session {
    pub const fn new(user: User, config: TrackingConfig) -> Self {
        Self { user, config }
    }
}
