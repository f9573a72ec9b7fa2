//! # LogWriter: tracing-backed event logger.
//!
//! Renders every [`Event`] as one `tracing` record. Data events are logged at
//! `trace` (they can be frequent), lifecycle records at `warn`/`error`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  spawned supervisor="cam1-LOYW3V28" pid=4242 attempt=0
//! TRACE data supervisor="cam1-LOYW3V28" channel=stdout len=18211
//! WARN  process exit supervisor="cam1-LOYW3V28" code=1 message="..."
//! ERROR watchdog exhausted supervisor="cam1-LOYW3V28" code=1 message="..."
//! INFO  stopped supervisor="cam1-LOYW3V28"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind, LifecycleKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let supervisor = &*e.supervisor;
        match &e.kind {
            EventKind::Data { channel, payload } => {
                tracing::trace!(supervisor, %channel, len = payload.len(), "data");
            }
            EventKind::ProcessSpawned { pid, attempt } => {
                tracing::info!(supervisor, pid = ?pid, attempt, "spawned");
            }
            EventKind::ProcessStopped => {
                tracing::info!(supervisor, "stopped");
            }
            EventKind::Lifecycle(rec) => match rec.kind {
                LifecycleKind::RecoverableExit => {
                    tracing::warn!(
                        supervisor,
                        code = ?rec.code,
                        signal = ?rec.signal,
                        message = %rec.message,
                        "process exit"
                    );
                }
                LifecycleKind::WatchdogExhausted => {
                    tracing::error!(
                        supervisor,
                        code = ?rec.code,
                        signal = ?rec.signal,
                        message = %rec.message,
                        params = %rec.params,
                        "watchdog exhausted"
                    );
                }
                LifecycleKind::SpawnFailed => {
                    tracing::error!(supervisor, message = %rec.message, params = %rec.params, "spawn failed");
                }
            },
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
