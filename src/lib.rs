//! # pipevisor
//!
//! **Pipevisor** supervises a long-running external transcoder process
//! (ffmpeg by default): it spawns it, watches it exit, respawns it under a
//! bounded retry policy, and republishes its three I/O channels, optionally
//! splitting image-pipe output into discrete frames.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Supervisor (handle, Clone)
//!      │ start / stop / write_input
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SupervisorActor (one task, one event at a time)                  │
//! │  - ProcessHandle  (live child, at most one)                       │
//! │  - ChannelRouter  (readers, input writer, FrameDemuxer per pipe)  │
//! │  - Watchdog       (attempt counter + health-window reset)         │
//! │  - RestartTimer   (cancellable deferred spawn)                    │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        │ Data             │ ProcessSpawned   │ Lifecycle
//!        │ (raw or frames)  │ ProcessStopped   │ (exit / exhausted / spawn failed)
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                   Notifier (broadcast channel)                    │
//! └─────────────┬───────────────────────────────────┬─────────────────┘
//!               ▼                                   ▼
//!      Supervisor::subscribe()              subscriber listener
//!         (stream of Event)                         │
//!                                              SubscriberSet
//!                                        ┌──────────┼──────────┐
//!                                        ▼          ▼          ▼
//!                                   LogWriter    custom     custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! start() ──► watchdog.reset() ──► spawn ──► ProcessSpawned
//!                                     │
//!                                     └─ error ──► SpawnFailed (never retried)
//!
//! process exit
//!   ├─► router.detach()
//!   └─► watchdog.on_exit(now)
//!         ├─ retry == 0          ─► RecoverableExit
//!         ├─ attempts < retry    ─► RecoverableExit + timer(wait) ──► spawn
//!         └─ attempts == retry   ─► WatchdogExhausted (terminal)
//!
//! stop() ──► detach, cancel timer, reset watchdog, kill ──► ProcessStopped
//! ```
//!
//! ## Features
//! | Area              | Description                                          | Key types                          |
//! |-------------------|------------------------------------------------------|------------------------------------|
//! | **Supervision**   | Spawn, stop, restart and feed the external process.  | [`Supervisor`], [`Status`]         |
//! | **Policies**      | Bounded respawn with a health-window reset.          | [`Watchdog`], [`ExitDecision`]     |
//! | **Demuxing**      | Split image-pipe output on codec end markers.        | [`FrameDemuxer`], [`Codec`]        |
//! | **Events**        | Typed data and lifecycle notifications.              | [`Event`], [`LifecycleEvent`]      |
//! | **Subscriber API**| Callback-style event handlers.                       | [`Subscribe`], [`SubscriberSet`]   |
//! | **Configuration** | Profiles, clamped ranges, JSON option bags.          | [`Config`], [`Options`]            |
//! | **Errors**        | Typed construction and handle errors.                | [`ConfigError`], [`SupervisorError`]|
//!
//! ## Optional features
//! - `logging`: exports a tracing-backed [`LogWriter`] subscriber.
//!
//! ## Example
//! ```no_run
//! use pipevisor::{Channel, Config, LifecycleKind, Profile, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(Profile::Standard)
//!         .name("garage")
//!         .retry(5)
//!         .codec(Channel::Primary, "mjpeg");
//!
//!     let sup = Supervisor::new(
//!         ["-i", "rtsp://garage/stream", "-f", "image2pipe", "-c", "mjpeg", "pipe:1"],
//!         config,
//!     )?;
//!     let mut events = sup.subscribe();
//!     sup.start().await?;
//!
//!     while let Ok(ev) = events.recv().await {
//!         if let Some(rec) = ev.as_lifecycle() {
//!             eprintln!("{}: {}", rec.kind.as_label(), rec.message);
//!             if rec.kind == LifecycleKind::WatchdogExhausted {
//!                 break;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod channel;
mod config;
mod core;
mod demux;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use channel::Channel;
pub use config::{Config, Options, Profile, RangePolicy, DEFAULT_NAME, DEFAULT_PROGRAM, RETRY_RANGE};
pub use core::{ExitReport, Status, Supervisor, SupervisorBuilder, MIN_PARAMS};
pub use demux::{ChannelMode, Codec, FrameDemuxer, Marker};
pub use error::{ConfigError, SupervisorError};
pub use events::{Event, EventKind, LifecycleEvent, LifecycleKind, Notifier};
pub use policies::{ExitDecision, Watchdog};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features "logging"`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
