//! # Supervisor: the cloneable handle to one supervised process.
//!
//! A [`Supervisor`] is a thin handle. All state lives in the actor task it
//! spawns on construction; handle methods send a command and await the reply.
//!
//! ## Architecture
//! ```text
//! Supervisor (handle, Clone)
//!   ├── start() / stop() ───────► [command queue] ──► SupervisorActor
//!   ├── write_input(bytes) ─────► [input queue]   ──► writer ──► pipe:0
//!   ├── status() ◄────────────── watch::Receiver<Status>
//!   └── subscribe() ◄─────────── Notifier (broadcast) ◄── SupervisorActor
//! ```
//!
//! ## Rules
//! - Construction validates the argument vector and never spawns
//! - `start()` on a running supervisor restarts it with a fresh watchdog
//! - `stop()` is idempotent and cancels any pending respawn
//! - Dropping the last handle stops the actor and kills the process
//!
//! ## Example
//! ```no_run
//! use pipevisor::{Channel, Config, Profile, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(Profile::Standard)
//!         .name("cam 1")
//!         .retry(3)
//!         .codec(Channel::Primary, "mjpeg");
//!     let sup = Supervisor::new(
//!         ["-i", "rtsp://cam1/stream", "-f", "mjpeg", "pipe:1"],
//!         config,
//!     )?;
//!
//!     let mut events = sup.subscribe();
//!     sup.start().await?;
//!     while let Ok(ev) = events.recv().await {
//!         if let Some((_, frame)) = ev.as_data() {
//!             println!("frame: {} bytes", frame.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::actor::{Command, Identity, Status, SupervisorActor};
use super::builder::SupervisorBuilder;
use crate::{
    config::{epoch_millis, unique_name, Config},
    error::{ConfigError, SupervisorError},
    events::{Event, Notifier},
};

/// Shortest argument vector accepted.
pub const MIN_PARAMS: usize = 3;

const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Handle to a supervised external process.
#[derive(Clone)]
pub struct Supervisor {
    identity: Identity,
    notifier: Notifier,
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Status>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.identity.name)
            .field("params", &self.identity.params)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Supervisor {
    /// Validates `argv` and spawns the (idle) supervisor actor.
    ///
    /// Must be called inside a tokio runtime. Fails when `argv` holds fewer
    /// than [`MIN_PARAMS`] entries.
    pub fn new<I, S>(argv: I, config: Config) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.len() < MIN_PARAMS {
            return Err(ConfigError::InvalidParams {
                len: argv.len(),
                min: MIN_PARAMS,
            });
        }

        let identity = Identity {
            name: Arc::from(unique_name(config.raw_name(), epoch_millis())),
            params: Arc::from(argv.join(" ")),
            argv: Arc::from(argv),
        };
        let notifier = Notifier::new(config.notifier_capacity_clamped());
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (status_tx, status_rx) = watch::channel(Status::default());

        tracing::debug!(
            supervisor = %identity.name,
            program = config.program_name(),
            params = %identity.params,
            "supervisor created"
        );

        let actor = SupervisorActor::new(identity.clone(), config, notifier.clone(), status_tx, cmd_rx);
        tokio::spawn(actor.run());

        Ok(Self {
            identity,
            notifier,
            commands: cmd_tx,
            status: status_rx,
        })
    }

    /// Starts a builder for a supervisor with event subscribers attached.
    pub fn builder<I, S>(argv: I, config: Config) -> SupervisorBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SupervisorBuilder::new(argv.into_iter().map(Into::into).collect(), config)
    }

    /// Spawns the process with a fresh watchdog.
    ///
    /// A running process is detached and killed first. A spawn failure is
    /// returned here and also published as a `SpawnFailed` lifecycle event.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        rx.await.map_err(|_| SupervisorError::Stopped)?
    }

    /// Detaches listeners, cancels any pending respawn and kills the process.
    ///
    /// Safe to call at any time; resolves once the actor has acted on it.
    pub async fn stop(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(Command::Stop { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Writes raw bytes to the input channel of the live process.
    pub async fn write_input(&self, data: impl Into<Bytes>) -> Result<(), SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Input { reply }).await?;
        let input = rx
            .await
            .map_err(|_| SupervisorError::Stopped)?
            .ok_or(SupervisorError::NotRunning)?;
        input
            .send(data.into())
            .await
            .map_err(|_| SupervisorError::InputClosed)
    }

    /// Whether a process is currently live.
    pub fn is_running(&self) -> bool {
        self.status.borrow().running
    }

    /// Latest status snapshot.
    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    /// Unique display name (`<name>-<base36 ms>`).
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Space-joined argument vector.
    pub fn params(&self) -> &str {
        &self.identity.params
    }

    pub fn argv(&self) -> &[String] {
        &self.identity.argv
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notifier.subscribe()
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    async fn send(&self, cmd: Command) -> Result<(), SupervisorError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| SupervisorError::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    #[tokio::test]
    async fn test_short_argv_rejected() {
        let err = Supervisor::new(["-i", "x"], Config::default()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidParams { len: 2, min: MIN_PARAMS });
    }

    #[tokio::test]
    async fn test_identity() {
        let sup = Supervisor::new(
            ["-i", "in.mp4", "pipe:1"],
            Config::new(Profile::Responsive).name("  front door "),
        )
        .unwrap();
        assert!(sup.name().starts_with("frontdoor-"));
        assert_eq!(sup.params(), "-i in.mp4 pipe:1");
        assert_eq!(sup.argv().len(), 3);
        assert!(!sup.is_running());
        assert_eq!(sup.status(), Status::default());
    }

    #[tokio::test]
    async fn test_idle_supervisor_commands() {
        let sup = Supervisor::new(["-i", "in.mp4", "pipe:1"], Config::default()).unwrap();
        let mut events = sup.subscribe();

        sup.stop().await;
        sup.stop().await;
        assert!(matches!(
            sup.write_input(&b"x"[..]).await,
            Err(SupervisorError::NotRunning)
        ));
        // Stopping an idle supervisor publishes nothing.
        assert!(events.try_recv().is_err());
    }
}
