//! Terminal rendition of the tracking window.

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ff_core::{Shell, Status};

/// Label shown before the first start, stop, or status change.
pub const READY_LABEL: &str = "Ready";

const IDLE_NOTICE: &str = "You are idle. Tracking is paused until you return.";
const WELCOME_BACK: &str = "Welcome back. Tracking resumed.";

/// Label and button state of the tracking window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanel {
    pub label: String,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub overlay_visible: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            label: READY_LABEL.to_string(),
            start_enabled: true,
            stop_enabled: false,
            overlay_visible: false,
        }
    }
}

impl ControlPanel {
    /// Returns false, changing nothing, when Start is disabled.
    pub fn press_start(&mut self) -> bool {
        if !self.start_enabled {
            return false;
        }
        Status::Active.as_str().clone_into(&mut self.label);
        self.start_enabled = false;
        self.stop_enabled = true;
        true
    }

    /// Returns false, changing nothing, when Stop is disabled.
    pub fn press_stop(&mut self) -> bool {
        if !self.stop_enabled {
            return false;
        }
        Status::Idle.as_str().clone_into(&mut self.label);
        self.start_enabled = true;
        self.stop_enabled = false;
        true
    }

    /// Applies a status pushed by the coordinator.
    ///
    /// Idle locks Start. Active unlocks it only while Stop is disabled.
    /// Stop itself is left alone.
    pub fn apply_status(&mut self, status: Status) {
        status.as_str().clone_into(&mut self.label);
        match status {
            Status::Idle => self.start_enabled = false,
            Status::Active => {
                if !self.stop_enabled {
                    self.start_enabled = true;
                }
            }
        }
    }
}

impl fmt::Display for ControlPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |enabled: bool| if enabled { "enabled" } else { "disabled" };
        write!(
            f,
            "Status: {} | Start: {} | Stop: {}",
            self.label,
            state(self.start_enabled),
            state(self.stop_enabled)
        )?;
        if self.overlay_visible {
            f.write_str(" | idle overlay shown")?;
        }
        Ok(())
    }
}

/// [`Shell`] that prints status changes and overlay notices as lines.
pub struct ConsoleShell<W> {
    panel: Mutex<ControlPanel>,
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleShell<W> {
    pub fn new(out: W) -> Self {
        Self {
            panel: Mutex::new(ControlPanel::default()),
            out: Mutex::new(out),
        }
    }

    /// Current panel state.
    pub fn panel(&self) -> ControlPanel {
        self.lock_panel().clone()
    }

    pub fn press_start(&self) -> bool {
        self.lock_panel().press_start()
    }

    pub fn press_stop(&self) -> bool {
        self.lock_panel().press_stop()
    }

    /// Writes one line. Write failures are logged and dropped.
    pub fn print(&self, line: impl fmt::Display) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(error = %err, "failed to write to console");
        }
    }

    fn lock_panel(&self) -> MutexGuard<'_, ControlPanel> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl ConsoleShell<Vec<u8>> {
    pub(crate) fn output(&self) -> String {
        let out = self.out.lock().unwrap();
        String::from_utf8(out.clone()).unwrap()
    }
}

impl<W> fmt::Debug for ConsoleShell<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleShell")
            .field("panel", &self.panel)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> Shell for ConsoleShell<W> {
    fn status_changed(&self, status: Status) {
        self.lock_panel().apply_status(status);
        self.print(format_args!("Status: {status}"));
    }

    fn show_idle_overlay(&self) {
        self.lock_panel().overlay_visible = true;
        self.print(IDLE_NOTICE);
    }

    fn hide_idle_overlay(&self) {
        self.lock_panel().overlay_visible = false;
        self.print(WELCOME_BACK);
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_panel_starts_ready() {
        let panel = ControlPanel::default();
        assert_eq!(panel.to_string(), "Status: Ready | Start: enabled | Stop: disabled");
    }

    #[test]
    fn test_start_then_stop_toggles_buttons() {
        let mut panel = ControlPanel::default();

        assert!(panel.press_start());
        assert_eq!(panel.label, "Active");
        assert!(!panel.start_enabled);
        assert!(panel.stop_enabled);

        assert!(panel.press_stop());
        assert_eq!(panel.label, "Idle");
        assert!(panel.start_enabled);
        assert!(!panel.stop_enabled);
    }

    #[test]
    fn test_disabled_buttons_do_nothing() {
        let mut panel = ControlPanel::default();
        assert!(!panel.press_stop());
        assert_eq!(panel, ControlPanel::default());

        panel.press_start();
        let started = panel.clone();
        assert!(!panel.press_start());
        assert_eq!(panel, started);
    }

    #[test]
    fn test_idle_locks_start() {
        let mut panel = ControlPanel::default();
        panel.apply_status(Status::Idle);

        assert_eq!(panel.label, "Idle");
        assert!(!panel.start_enabled);
        assert!(!panel.press_start());
    }

    #[test]
    fn test_active_unlocks_start_only_when_stopped() {
        let mut tracking = ControlPanel::default();
        tracking.press_start();
        tracking.apply_status(Status::Idle);
        tracking.apply_status(Status::Active);
        assert!(!tracking.start_enabled);
        assert!(tracking.stop_enabled);

        let mut stopped = ControlPanel::default();
        stopped.apply_status(Status::Idle);
        stopped.apply_status(Status::Active);
        assert!(stopped.start_enabled);
        assert!(!stopped.stop_enabled);
    }

    #[test]
    fn test_console_shell_prints_idle_cycle() {
        let shell = ConsoleShell::new(Vec::new());
        shell.press_start();

        shell.status_changed(Status::Idle);
        shell.show_idle_overlay();
        assert!(shell.panel().overlay_visible);
        shell.print(shell.panel());
        shell.status_changed(Status::Active);
        shell.hide_idle_overlay();
        shell.print(shell.panel());

        assert_snapshot!(shell.output(), @r"
        Status: Idle
        You are idle. Tracking is paused until you return.
        Status: Idle | Start: disabled | Stop: enabled | idle overlay shown
        Status: Active
        Welcome back. Tracking resumed.
        Status: Active | Start: disabled | Stop: enabled
        ");
    }
}
