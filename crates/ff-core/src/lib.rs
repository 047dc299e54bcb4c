//! Core domain types for the FocusFlow activity agent.
//!
//! This crate contains:
//! - Session identity and tracking settings, including the override/default merge
//! - Reports and the telemetry sink they are handed to
//! - The sampler and UI shell capabilities the coordinator depends on
//! - Pure idle/active classification

mod report;
pub mod sampler;
mod session;
pub mod settings;
pub mod state;
mod status;
mod types;

pub use report::{IDLE_APPLICATION_NAME, IDLE_WINDOW_TITLE, Report, ReportForm, TelemetrySink};
pub use sampler::{ActiveWindow, FocusSampler, IdleSampler, SamplerError};
pub use session::Session;
pub use settings::{DefaultSettings, SettingsOverride, TrackingConfig};
pub use state::{Effect, IDLE_POLL_INTERVAL, IdleClassifier, Mode, Transition};
pub use status::{Shell, Status};
pub use types::{User, UserId, ValidationError};
