//! # SupervisorActor: the single-threaded reactive loop.
//!
//! Owns everything that changes over a supervisor's lifetime: the live
//! [`ProcessHandle`], the [`ChannelRouter`], the [`Watchdog`] and the
//! [`RestartTimer`]. Every input is an event handled to completion before the
//! next one is looked at, so state is never touched concurrently.
//!
//! ## Event sources
//! ```text
//! loop {
//!   select! (biased) {
//!     command  ← Supervisor handle    → start / stop / input sender
//!     timer    ← RestartTimer         → respawn
//!     exit     ← ProcessHandle::wait  → detach, classify, watchdog decision
//!     chunk    ← ChannelRouter        → route → publish Data
//!   }
//! }
//! ```
//!
//! ## Exit handling
//! ```text
//! exit observed
//!   ├─► router.drain(EXIT_DRAIN_GRACE) (output written before the exit)
//!   ├─► router.detach()                (no stale data after this point)
//!   ├─► ExitReport → message
//!   └─► watchdog.on_exit(now)
//!         ├─ Report    → publish RecoverableExit
//!         ├─ Respawn   → timer.schedule(wait), publish RecoverableExit (+ delay)
//!         └─ Exhausted → publish WatchdogExhausted
//! ```
//!
//! ## Rules
//! - At most one live process and at most one pending restart
//! - Commands are served before the timer, so a `stop()` that is already queued
//!   always wins against a due restart
//! - Spawn failures are reported once and never retried
//! - Output read before an exit is published before that exit's lifecycle record
//! - When every handle is dropped the loop ends and the process is killed

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use super::process::{ExitReport, ProcessHandle};
use super::router::ChannelRouter;
use super::timer::RestartTimer;
use crate::{
    channel::Channel,
    config::Config,
    error::SupervisorError,
    events::{Event, EventKind, LifecycleEvent, LifecycleKind, Notifier},
    policies::{ExitDecision, Watchdog},
};

/// Upper bound on reading leftover output once the process has exited.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Best-effort snapshot of a supervisor, refreshed after every handled event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// A process is spawned and its exit not yet observed.
    pub running: bool,
    /// OS id of the live process.
    pub pid: Option<u32>,
    /// Current watchdog attempt counter.
    pub attempts: u32,
    /// A respawn is scheduled and has not fired yet.
    pub restart_pending: bool,
}

/// Requests sent from [`Supervisor`](crate::Supervisor) handles.
pub(crate) enum Command {
    Start {
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Input {
        reply: oneshot::Sender<Option<mpsc::Sender<Bytes>>>,
    },
}

/// Identity shared by the handle and the actor.
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    pub name: Arc<str>,
    pub argv: Arc<[String]>,
    pub params: Arc<str>,
}

pub(crate) struct SupervisorActor {
    identity: Identity,
    config: Config,
    watchdog: Watchdog,
    timer: RestartTimer,
    process: Option<ProcessHandle>,
    router: ChannelRouter,
    notifier: Notifier,
    status: watch::Sender<Status>,
    commands: mpsc::Receiver<Command>,
}

impl SupervisorActor {
    pub fn new(
        identity: Identity,
        config: Config,
        notifier: Notifier,
        status: watch::Sender<Status>,
        commands: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            identity,
            watchdog: Watchdog::from_config(&config),
            timer: RestartTimer::default(),
            process: None,
            router: ChannelRouter::idle(config.channels()),
            config,
            notifier,
            status,
            commands,
        }
    }

    /// Runs until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = self.timer.fired() => self.respawn(),
                res = wait_exit(&mut self.process) => self.handle_exit(res).await,
                (channel, chunk) = self.router.next_chunk() => {
                    if let Some(payload) = self.router.route(channel, chunk) {
                        self.publish_data(channel, payload);
                    }
                }
            }
        }

        self.router.detach();
        self.timer.cancel();
        if let Some(process) = self.process.take() {
            process.kill();
        }
        tracing::debug!(supervisor = %self.identity.name, "supervisor actor finished");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { reply } => {
                let res = self.start();
                let _ = reply.send(res);
            }
            Command::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            Command::Input { reply } => {
                let _ = reply.send(self.router.input());
            }
        }
    }

    /// Caller-initiated (re)start: fresh watchdog, at most one live process.
    fn start(&mut self) -> Result<(), SupervisorError> {
        self.router.detach();
        self.timer.cancel();
        self.watchdog.reset();
        if let Some(old) = self.process.take() {
            tracing::info!(supervisor = %self.identity.name, pid = ?old.pid(), "restarting on request");
            old.kill();
        }
        self.spawn()
    }

    /// Detaches listeners first, disarms the watchdog, then kills. Idempotent.
    fn stop(&mut self) {
        let active = self.process.is_some() || self.timer.is_pending();
        self.router.detach();
        self.timer.cancel();
        self.watchdog.reset();
        if let Some(process) = self.process.take() {
            process.kill();
        }
        self.refresh_status();
        if active {
            tracing::info!(supervisor = %self.identity.name, "stopped");
            self.notifier.publish(Event::new(
                Arc::clone(&self.identity.name),
                EventKind::ProcessStopped,
            ));
        }
    }

    fn respawn(&mut self) {
        tracing::debug!(
            supervisor = %self.identity.name,
            attempt = self.watchdog.attempts(),
            "restart timer fired"
        );
        // A failed respawn is already reported as SpawnFailed; nothing else to do.
        let _ = self.spawn();
    }

    fn spawn(&mut self) -> Result<(), SupervisorError> {
        let program = self.config.program_name();
        match ProcessHandle::spawn(program, &self.identity.argv) {
            Ok(mut process) => {
                if let Some(streams) = process.take_streams() {
                    self.router = ChannelRouter::attach(
                        self.config.channels(),
                        streams,
                        self.config.input_capacity_clamped(),
                    );
                }
                let pid = process.pid();
                let attempt = self.watchdog.attempts();
                tracing::info!(supervisor = %self.identity.name, pid = ?pid, attempt, "process spawned");
                self.process = Some(process);
                self.refresh_status();
                self.notifier.publish(Event::new(
                    Arc::clone(&self.identity.name),
                    EventKind::ProcessSpawned { pid, attempt },
                ));
                Ok(())
            }
            Err(source) => {
                self.refresh_status();
                let message = format!("Unable to start {program}: {source}. Is it installed?");
                tracing::error!(
                    supervisor = %self.identity.name,
                    program,
                    error = %source,
                    "spawn failed"
                );
                self.notifier.publish(Event::lifecycle(self.record(
                    LifecycleKind::SpawnFailed,
                    ExitReport::default(),
                    message,
                )));
                Err(SupervisorError::Spawn {
                    program: program.to_string(),
                    source,
                })
            }
        }
    }

    async fn handle_exit(&mut self, res: io::Result<ExitStatus>) {
        self.process = None;
        for (channel, payload) in self.router.drain(EXIT_DRAIN_GRACE).await {
            self.publish_data(channel, payload);
        }
        self.router.detach();

        let report = match res {
            Ok(status) => ExitReport::from_status(&status),
            Err(err) => {
                tracing::warn!(supervisor = %self.identity.name, error = %err, "wait on process failed");
                ExitReport::default()
            }
        };
        let message = report.message(self.config.program_name());

        let record = match self.watchdog.on_exit(Instant::now()) {
            ExitDecision::Report => {
                tracing::warn!(
                    supervisor = %self.identity.name,
                    code = ?report.code,
                    signal = ?report.signal,
                    "process exited"
                );
                self.record(LifecycleKind::RecoverableExit, report, message)
            }
            ExitDecision::Respawn { attempt, delay } => {
                self.timer.schedule(delay);
                tracing::warn!(
                    supervisor = %self.identity.name,
                    code = ?report.code,
                    signal = ?report.signal,
                    attempt,
                    delay = ?delay,
                    "process exited, respawn scheduled"
                );
                let message = format!(
                    "{message} Watchdog will attempt to respawn in {} seconds.",
                    delay.as_secs_f64()
                );
                self.record(LifecycleKind::RecoverableExit, report, message)
            }
            ExitDecision::Exhausted { attempts } => {
                tracing::error!(
                    supervisor = %self.identity.name,
                    code = ?report.code,
                    signal = ?report.signal,
                    attempts,
                    "watchdog exhausted"
                );
                let message = format!(
                    "Watchdog has failed to respawn after {} failed attempts.",
                    self.watchdog.retry_limit()
                );
                self.record(LifecycleKind::WatchdogExhausted, report, message)
            }
        };

        self.refresh_status();
        self.notifier.publish(Event::lifecycle(record));
    }

    fn publish_data(&self, channel: Channel, payload: Bytes) {
        self.notifier
            .publish(Event::data(Arc::clone(&self.identity.name), channel, payload));
    }

    fn record(&self, kind: LifecycleKind, report: ExitReport, message: String) -> LifecycleEvent {
        LifecycleEvent {
            kind,
            code: report.code,
            signal: report.signal,
            message: Arc::from(message),
            supervisor: Arc::clone(&self.identity.name),
            params: Arc::clone(&self.identity.params),
        }
    }

    fn refresh_status(&self) {
        self.status.send_replace(Status {
            running: self.process.is_some(),
            pid: self.process.as_ref().and_then(ProcessHandle::pid),
            attempts: self.watchdog.attempts(),
            restart_pending: self.timer.is_pending(),
        });
    }
}

async fn wait_exit(process: &mut Option<ProcessHandle>) -> io::Result<ExitStatus> {
    match process.as_mut() {
        Some(process) => process.wait().await,
        None => std::future::pending().await,
    }
}
