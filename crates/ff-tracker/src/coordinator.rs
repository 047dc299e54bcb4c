//! The coordinator task and the handle the UI drives it through.

use std::any::Any;
use std::fmt;
use std::future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use ff_core::{
    ActiveWindow, Effect, FocusSampler, IDLE_POLL_INTERVAL, IdleClassifier, IdleSampler, Mode,
    Report, SamplerError, Session, Shell, Status, TelemetrySink,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinError, JoinHandle};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// External capabilities the coordinator calls into.
pub struct Collaborators {
    pub focus: Arc<dyn FocusSampler>,
    pub idle: Arc<dyn IdleSampler>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub shell: Arc<dyn Shell>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Point-in-time view of the coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub status: Status,
    pub sampler_running: bool,
    pub watcher_running: bool,
}

impl Snapshot {
    pub const fn mode(&self) -> Mode {
        Mode::new(self.status, self.sampler_running)
    }
}

enum Command {
    Start,
    Stop,
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Handle to a running session.
///
/// Dropping the handle ends the session the same way [`shutdown`] does, but
/// without waiting for the coordinator to finish.
///
/// [`shutdown`]: SessionHandle::shutdown
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
    session: Session,
}

impl SessionHandle {
    /// Starts the idle watcher for `session`. The activity sampler stays off
    /// until [`start_tracking`](Self::start_tracking) or the user returns from idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: Session, collaborators: Collaborators) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(session.clone(), collaborators, receiver);
        let task = tokio::spawn(coordinator.run());
        Self {
            commands,
            task,
            session,
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Starts the activity sampler. Ignored while idle or already running.
    pub fn start_tracking(&self) {
        self.send(Command::Start);
    }

    /// Stops the activity sampler. Ignored when not running.
    pub fn stop_tracking(&self) {
        self.send(Command::Stop);
    }

    /// Returns `None` once the coordinator has stopped.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply));
        response.await.ok()
    }

    /// Cancels both timers and waits for the coordinator to exit.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "coordinator task ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("coordinator already stopped; command dropped");
        }
    }
}

type FocusOutcome = Result<Option<ActiveWindow>, SamplerError>;
type IdleOutcome = Result<u64, SamplerError>;

enum Wake {
    Command(Option<Command>),
    WatchIdle,
    IdleRead(Result<IdleOutcome, JoinError>),
    Sample,
    FocusRead(Result<FocusOutcome, JoinError>),
}

struct Coordinator {
    session: Session,
    classifier: IdleClassifier,
    focus: Arc<dyn FocusSampler>,
    idle: Arc<dyn IdleSampler>,
    telemetry: Arc<dyn TelemetrySink>,
    shell: Arc<dyn Shell>,
    commands: mpsc::UnboundedReceiver<Command>,
    sampler: Option<Interval>,
    watcher: Option<Interval>,
    // Sampler queries run on the blocking pool, at most one of each at a time.
    idle_query: Option<JoinHandle<IdleOutcome>>,
    focus_query: Option<JoinHandle<FocusOutcome>>,
    /// A sample tick that fired while an idle query was in flight.
    sample_deferred: bool,
    cleaned_up: bool,
}

impl Coordinator {
    fn new(
        session: Session,
        collaborators: Collaborators,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            classifier: IdleClassifier::new(session.config.idle_threshold),
            session,
            focus: collaborators.focus,
            idle: collaborators.idle,
            telemetry: collaborators.telemetry,
            shell: collaborators.shell,
            commands,
            sampler: None,
            watcher: None,
            idle_query: None,
            focus_query: None,
            sample_deferred: false,
            cleaned_up: false,
        }
    }

    async fn run(mut self) {
        self.watcher = Some(periodic(IDLE_POLL_INTERVAL));
        tracing::info!(
            user_id = %self.session.user.id,
            idle_threshold_ms = self.session.config.idle_threshold_ms(),
            "idle watcher started"
        );

        loop {
            // Commands first, then the watcher: a sample that fires on the
            // same instant as an idle transition is dropped.
            let wake = tokio::select! {
                biased;
                command = self.commands.recv() => Wake::Command(command),
                () = next_tick(self.watcher.as_mut()) => Wake::WatchIdle,
                read = next_outcome(self.idle_query.as_mut()) => Wake::IdleRead(read),
                () = next_tick(self.sampler.as_mut()) => Wake::Sample,
                read = next_outcome(self.focus_query.as_mut()) => Wake::FocusRead(read),
            };

            match wake {
                Wake::Command(Some(Command::Start)) => self.start_sampler(),
                Wake::Command(Some(Command::Stop)) => self.stop_sampler(),
                Wake::Command(Some(Command::Snapshot(reply))) => {
                    let _ = reply.send(self.snapshot());
                }
                Wake::Command(Some(Command::Shutdown) | None) => break,
                Wake::WatchIdle => self.guarded("idle watcher", Self::query_idle),
                Wake::IdleRead(read) => {
                    self.idle_query = None;
                    if let Some(reading) = joined("idle watcher", read) {
                        self.guarded("idle watcher", |this| this.classify(reading));
                    }
                    if mem::take(&mut self.sample_deferred) {
                        self.guarded("activity sampler", Self::query_focus);
                    }
                }
                Wake::Sample => self.guarded("activity sampler", Self::query_focus),
                Wake::FocusRead(read) => {
                    self.focus_query = None;
                    if let Some(reading) = joined("activity sampler", read) {
                        self.guarded("activity sampler", |this| this.report_focus(reading));
                    }
                }
            }
        }

        self.cleanup();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.classifier.status(),
            sampler_running: self.sampler.is_some(),
            watcher_running: self.watcher.is_some(),
        }
    }

    /// Runs one tick body; a panic inside it is logged and the timers keep going.
    fn guarded(&mut self, tick: &'static str, body: impl FnOnce(&mut Self)) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| body(self))) {
            tracing::error!(
                tick,
                panic = panic_message(payload.as_ref()),
                "tick aborted"
            );
        }
    }

    fn query_idle(&mut self) {
        if self.idle_query.is_some() {
            tracing::debug!("previous idle query still running; tick skipped");
            return;
        }
        let idle = Arc::clone(&self.idle);
        self.idle_query = Some(task::spawn_blocking(move || idle.idle_seconds()));
    }

    fn classify(&mut self, reading: IdleOutcome) {
        let idle_secs = match reading {
            Ok(secs) => secs,
            Err(err) => {
                tracing::warn!(error = %err, "idle time query failed; retrying next tick");
                return;
            }
        };

        let Some(transition) = self.classifier.observe(idle_secs) else {
            tracing::trace!(idle_secs, status = %self.classifier.status(), "presence unchanged");
            return;
        };

        tracing::info!(idle_secs, status = %transition.status(), "presence changed");
        for effect in transition.effects() {
            self.apply(*effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StopSampler => self.stop_sampler(),
            Effect::StartSampler => self.start_sampler(),
            Effect::Notify(status) => self.shell.status_changed(status),
            Effect::ShowOverlay => self.shell.show_idle_overlay(),
            Effect::HideOverlay => self.shell.hide_idle_overlay(),
            Effect::SendIdleReport => {
                tracing::debug!(user_id = %self.session.user.id, "sending idle report");
                self.telemetry
                    .submit(Report::idle(self.session.user.id.clone()));
            }
        }
    }

    fn start_sampler(&mut self) {
        if self.sampler.is_some() || self.classifier.is_idle() {
            tracing::debug!(
                running = self.sampler.is_some(),
                idle = self.classifier.is_idle(),
                "tracking start ignored"
            );
            return;
        }

        self.sampler = Some(periodic(self.session.config.sample_interval));
        tracing::info!(
            interval_ms = self.session.config.sample_interval_ms(),
            "tracking started"
        );
    }

    fn stop_sampler(&mut self) {
        if self.sampler.take().is_some() {
            tracing::info!("tracking stopped");
        }
    }

    fn query_focus(&mut self) {
        tracing::debug!("activity sampler fired");
        if self.classifier.is_idle() || self.sampler.is_none() {
            tracing::debug!("skipping sample while tracking is paused");
            return;
        }
        if self.idle_query.is_some() {
            tracing::debug!("idle query in flight; sample deferred");
            self.sample_deferred = true;
            return;
        }
        if self.focus_query.is_some() {
            tracing::debug!("previous focus query still running; tick skipped");
            return;
        }
        let focus = Arc::clone(&self.focus);
        self.focus_query = Some(task::spawn_blocking(move || focus.active_window()));
    }

    fn report_focus(&mut self, reading: FocusOutcome) {
        // The query ran off the loop: tracking may have paused since it was sent.
        if self.classifier.is_idle() || self.sampler.is_none() {
            tracing::debug!("tracking paused during focus query; sample dropped");
            return;
        }

        match reading {
            Ok(Some(window)) => {
                tracing::debug!(
                    app = %window.app_name,
                    title = %window.window_title,
                    "sending activity report"
                );
                self.telemetry
                    .submit(Report::activity(self.session.user.id.clone(), window));
            }
            Ok(None) => tracing::debug!("no active window"),
            Err(err) => tracing::warn!(error = %err, "focus query failed"),
        }
    }

    fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.sampler = None;
        self.watcher = None;
        self.sample_deferred = false;
        // A blocking call already running cannot be interrupted; its result is discarded.
        if let Some(query) = self.idle_query.take() {
            query.abort();
        }
        if let Some(query) = self.focus_query.take() {
            query.abort();
        }
        tracing::info!("all timers cleaned up");
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        // Covers the task being aborted mid-loop, e.g. at runtime shutdown.
        self.cleanup();
    }
}

/// A timer whose first tick fires one full period after arming.
fn periodic(period: Duration) -> Interval {
    let mut timer = time::interval_at(Instant::now() + period, period);
    // No catch-up burst after the machine wakes from sleep.
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn next_tick(timer: Option<&mut Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

async fn next_outcome<T>(query: Option<&mut JoinHandle<T>>) -> Result<T, JoinError> {
    match query {
        Some(query) => query.await,
        None => future::pending().await,
    }
}

/// Unwraps a finished sampler query, logging one that panicked.
fn joined<T>(tick: &'static str, read: Result<T, JoinError>) -> Option<T> {
    match read {
        Ok(reading) => Some(reading),
        Err(err) => {
            match err.try_into_panic() {
                Ok(payload) => tracing::error!(
                    tick,
                    panic = panic_message(payload.as_ref()),
                    "tick aborted"
                ),
                Err(err) => tracing::warn!(tick, error = %err, "sampler query cancelled"),
            }
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
