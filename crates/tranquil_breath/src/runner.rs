//! Tokio driver for a [`BreathSession`].
//!
//! The runner owns the session inside a spawned task. It:
//! - Advances the session on every heartbeat by the time the clock says has
//!   passed since the last one
//! - Applies pause / resume / cancel commands in order with the heartbeat
//! - Publishes [`Progress`] on a watch channel for displays to follow
//! - Hands the final summary to a [`SessionSink`] once the session ends
//!
//! Dropping every handle to the runner cancels the session.

use crate::error::SessionError;
use crate::heartbeat::HeartbeatConfig;
use crate::session::{BreathSession, Progress};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tranquil_core::{elapsed_ms, Clock, SessionSink, SessionSummary};
use uuid::Uuid;

type Reply = oneshot::Sender<Result<(), SessionError>>;

#[derive(Debug)]
enum Command {
    Pause(Reply),
    Resume(Reply),
    Cancel(Reply),
}

/// Handle to a session running on a background task.
pub struct SessionRunner {
    session_id: Uuid,
    pattern_id: String,
    commands: mpsc::Sender<Command>,
    progress_rx: watch::Receiver<Progress>,
    handle: JoinHandle<Option<SessionSummary>>,
}

impl SessionRunner {
    /// Start driving `session`. Must be called within a Tokio runtime.
    pub fn spawn(
        session: BreathSession,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn SessionSink>,
        heartbeat: HeartbeatConfig,
    ) -> Self {
        let (commands, command_rx) = mpsc::channel(16);
        let (progress_tx, progress_rx) = watch::channel(session.progress());
        let session_id = session.id();
        let pattern_id = session.pattern().id.clone();
        // time counts from spawn, not from whenever the task is first polled
        let started = clock.now();

        let handle = tokio::spawn(drive(
            session,
            started,
            clock,
            sink,
            heartbeat,
            command_rx,
            progress_tx,
        ));

        Self {
            session_id,
            pattern_id,
            commands,
            progress_rx,
            handle,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    /// Pause after catching the session up to the current time.
    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(Command::Pause).await
    }

    /// Resume; time spent paused is never counted.
    pub async fn resume(&self) -> Result<(), SessionError> {
        self.request(Command::Resume).await
    }

    pub async fn cancel(&self) -> Result<(), SessionError> {
        self.request(Command::Cancel).await
    }

    /// Latest published progress
    pub fn progress(&self) -> Progress {
        *self.progress_rx.borrow()
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the session to end and return its summary.
    pub async fn join(self) -> Result<SessionSummary, SessionError> {
        // hold the command sender so waiting doesn't read as abandonment
        let Self {
            commands, handle, ..
        } = self;
        let outcome = handle.await;
        drop(commands);

        match outcome {
            Ok(Some(summary)) => Ok(summary),
            Ok(None) => Err(SessionError::DriverStopped),
            Err(e) => {
                tracing::error!("Session driver failed: {}", e);
                Err(SessionError::DriverStopped)
            }
        }
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::DriverStopped)?;
        reply_rx.await.map_err(|_| SessionError::DriverStopped)?
    }
}

/// Milliseconds since `last`, moving `last` forward by exactly that much so
/// sub-millisecond remainders carry over to the next read.
fn take_elapsed(last: &mut DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    if now < *last {
        *last = now;
        return 0;
    }
    let dt = elapsed_ms(*last, now);
    *last += chrono::Duration::milliseconds(i64::try_from(dt).unwrap_or(i64::MAX / 2));
    dt
}

async fn drive(
    mut session: BreathSession,
    started: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn SessionSink>,
    heartbeat: HeartbeatConfig,
    mut commands: mpsc::Receiver<Command>,
    progress_tx: watch::Sender<Progress>,
) -> Option<SessionSummary> {
    let mut interval = tokio::time::interval(heartbeat.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = started;

    while !session.is_terminal() {
        let mut pending = None;
        tokio::select! {
            _ = interval.tick() => {
                let dt = take_elapsed(&mut last, clock.now());
                session.tick(dt);
            }

            command = commands.recv() => {
                pending = match command {
                    Some(Command::Pause(reply)) => {
                        let dt = take_elapsed(&mut last, clock.now());
                        session.tick(dt);
                        Some((reply, session.pause()))
                    }
                    Some(Command::Resume(reply)) => {
                        // a running session keeps its time; a paused one
                        // ignores the tick, dropping the paused stretch
                        let dt = take_elapsed(&mut last, clock.now());
                        session.tick(dt);
                        Some((reply, session.resume()))
                    }
                    Some(Command::Cancel(reply)) => Some((reply, session.cancel())),
                    None => {
                        tracing::warn!(
                            "All handles to session {} dropped, cancelling",
                            session.id()
                        );
                        let _ = session.cancel();
                        None
                    }
                };
            }
        }

        // publish before replying so callers see the effect of their command
        let _ = progress_tx.send(session.progress());
        if let Some((reply, result)) = pending {
            let _ = reply.send(result);
        }
    }

    let summary = session.summary(clock.now())?;
    if let Err(e) = sink.record(&summary).await {
        tracing::error!("Failed to record session {}: {:#}", summary.session_id, e);
    }
    Some(summary)
}
