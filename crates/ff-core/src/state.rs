//! Idle/active classification and the side effects of each transition.
//!
//! The classifier is pure: it records the new status and hands back the
//! ordered effects the scheduler must carry out. Keeping the order here means
//! every scheduler applies it the same way.

use std::time::Duration;

use crate::status::Status;

/// Poll period of the idle watcher. Not configurable.
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A change in presence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BecameIdle,
    BecameActive,
}

/// One side effect of a transition, applied after the status flag changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StopSampler,
    StartSampler,
    Notify(Status),
    ShowOverlay,
    HideOverlay,
    SendIdleReport,
}

impl Transition {
    /// Effects in the order they must run.
    pub const fn effects(self) -> &'static [Effect] {
        match self {
            Self::BecameIdle => &[
                Effect::StopSampler,
                Effect::Notify(Status::Idle),
                Effect::ShowOverlay,
                Effect::SendIdleReport,
            ],
            Self::BecameActive => &[
                Effect::Notify(Status::Active),
                Effect::HideOverlay,
                Effect::StartSampler,
            ],
        }
    }

    /// Status after the transition.
    pub const fn status(self) -> Status {
        match self {
            Self::BecameIdle => Status::Idle,
            Self::BecameActive => Status::Active,
        }
    }
}

/// Effective tracking mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// User is away; nothing is sampled.
    Idle,
    /// User is present and the activity sampler is live.
    ActiveRunning,
    /// User is present but tracking is stopped.
    ActiveStopped,
}

impl Mode {
    pub const fn new(status: Status, sampler_running: bool) -> Self {
        match (status, sampler_running) {
            (Status::Idle, _) => Self::Idle,
            (Status::Active, true) => Self::ActiveRunning,
            (Status::Active, false) => Self::ActiveStopped,
        }
    }
}

/// Compares idle readings against a threshold and tracks the current status.
#[derive(Debug, Clone)]
pub struct IdleClassifier {
    threshold: Duration,
    status: Status,
}

impl IdleClassifier {
    /// Starts out `Active`.
    pub const fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            status: Status::Active,
        }
    }

    pub const fn status(&self) -> Status {
        self.status
    }

    pub const fn is_idle(&self) -> bool {
        self.status.is_idle()
    }

    /// Classifies one reading. Updates the status and returns the transition
    /// when the classification changed, `None` otherwise.
    pub fn observe(&mut self, idle_secs: u64) -> Option<Transition> {
        let idle = Duration::from_secs(idle_secs) >= self.threshold;
        let transition = match (self.status, idle) {
            (Status::Active, true) => Transition::BecameIdle,
            (Status::Idle, false) => Transition::BecameActive,
            _ => return None,
        };
        self.status = transition.status();
        Some(transition)
    }
}
