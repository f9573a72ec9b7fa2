//! # Events published by a supervisor.
//!
//! The [`EventKind`] enum classifies events in two groups:
//! - **Data events**: one frame or chunk from a process channel
//! - **Lifecycle events**: spawn/stop notices and the unified
//!   [`LifecycleEvent`] error record (recoverable exit, exhausted watchdog,
//!   failed spawn)
//!
//! ## Ordering guarantees
//! The publishing [`Notifier`](crate::Notifier) stamps each event with a sequence
//! number (`seq`) that increases monotonically per supervisor. Events of one
//! channel are published in arrival order.
//!
//! ## Example
//! ```rust
//! use bytes::Bytes;
//! use pipevisor::{Channel, Event, EventKind};
//!
//! let ev = Event::data("cam-1", Channel::Primary, Bytes::from_static(b"\xFF\xD9"));
//! assert!(matches!(ev.kind, EventKind::Data { channel: Channel::Primary, .. }));
//! assert_eq!(&*ev.supervisor, "cam-1");
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

use crate::channel::Channel;

/// Discriminant of a [`LifecycleEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    /// The process exited; a respawn is scheduled, or retries are disabled.
    RecoverableExit,
    /// The process exited and the retry limit is reached. Terminal until restarted.
    WatchdogExhausted,
    /// The program could not be launched. Never retried.
    SpawnFailed,
}

impl LifecycleKind {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            LifecycleKind::RecoverableExit => "process_exit",
            LifecycleKind::WatchdogExhausted => "watchdog_fail",
            LifecycleKind::SpawnFailed => "spawn_failed",
        }
    }
}

/// Immutable record describing why a supervised process is gone.
///
/// Produced exactly once per classified exit (and once per failed spawn).
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    /// What happened.
    pub kind: LifecycleKind,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal name, if the process was killed.
    pub signal: Option<Arc<str>>,
    /// Human-readable description.
    pub message: Arc<str>,
    /// Display name of the reporting supervisor.
    pub supervisor: Arc<str>,
    /// Argument vector of the reporting supervisor, joined by spaces.
    pub params: Arc<str>,
}

impl LifecycleEvent {
    /// Whether the watchdog gave up (or never could start).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, LifecycleKind::RecoverableExit)
    }
}

/// Classification of published events.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A frame (demux mode) or raw chunk (passthrough) from `channel`.
    Data { channel: Channel, payload: Bytes },

    /// A process was spawned.
    ///
    /// `attempt` is the watchdog counter at spawn time (`0` for a caller-initiated start).
    ProcessSpawned { pid: Option<u32>, attempt: u32 },

    /// The process was stopped on request and the watchdog disarmed.
    ProcessStopped,

    /// Unified lifecycle-error record.
    Lifecycle(LifecycleEvent),
}

/// Published event with ordering metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Per-supervisor sequence number, assigned on publish (`0` until then).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Display name of the publishing supervisor.
    pub supervisor: Arc<str>,
    /// Event classification and payload.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new, not yet published event stamped with the current time.
    pub fn new(supervisor: impl Into<Arc<str>>, kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            supervisor: supervisor.into(),
            kind,
        }
    }

    /// Creates a data event.
    #[inline]
    pub fn data(supervisor: impl Into<Arc<str>>, channel: Channel, payload: Bytes) -> Self {
        Self::new(supervisor, EventKind::Data { channel, payload })
    }

    /// Creates a lifecycle event, reusing the record's supervisor name.
    #[inline]
    pub fn lifecycle(record: LifecycleEvent) -> Self {
        Self::new(Arc::clone(&record.supervisor), EventKind::Lifecycle(record))
    }

    /// Payload of a data event.
    pub fn as_data(&self) -> Option<(Channel, &Bytes)> {
        match &self.kind {
            EventKind::Data { channel, payload } => Some((*channel, payload)),
            _ => None,
        }
    }

    /// Record of a lifecycle event.
    pub fn as_lifecycle(&self) -> Option<&LifecycleEvent> {
        match &self.kind {
            EventKind::Lifecycle(record) => Some(record),
            _ => None,
        }
    }

    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self.kind, EventKind::Data { .. })
    }

    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match &self.kind {
            EventKind::Data { .. } => "data",
            EventKind::ProcessSpawned { .. } => "process_spawned",
            EventKind::ProcessStopped => "process_stopped",
            EventKind::Lifecycle(record) => record.kind.as_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: LifecycleKind) -> LifecycleEvent {
        LifecycleEvent {
            kind,
            code: Some(1),
            signal: None,
            message: Arc::from("bad parameters"),
            supervisor: Arc::from("cam-X"),
            params: Arc::from("-i a b"),
        }
    }

    #[test]
    fn test_lifecycle_accessors() {
        let ev = Event::lifecycle(record(LifecycleKind::WatchdogExhausted));
        assert_eq!(&*ev.supervisor, "cam-X");
        assert_eq!(ev.as_label(), "watchdog_fail");
        let rec = ev.as_lifecycle().expect("lifecycle");
        assert!(rec.is_terminal());
        assert!(ev.as_data().is_none());
    }

    #[test]
    fn test_recoverable_is_not_terminal() {
        assert!(!record(LifecycleKind::RecoverableExit).is_terminal());
        assert!(record(LifecycleKind::SpawnFailed).is_terminal());
    }
}
