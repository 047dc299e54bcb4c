//! Tracking coordinator for the FocusFlow agent.
//!
//! A single task owns the session state and multiplexes the idle watcher
//! timer, the activity sampler timer, and UI commands. Every state change
//! happens on that task, so no locking is involved.

mod coordinator;

pub use coordinator::{Collaborators, SessionHandle, Snapshot};
