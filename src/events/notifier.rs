//! # Notifier: typed publish/subscribe surface of a supervisor.
//!
//! [`Notifier`] is a thin wrapper around [`tokio::sync::broadcast`]. The
//! supervisor actor is the only publisher; callers and the subscriber listener
//! are receivers.
//!
//! ## Architecture
//! ```text
//! Publisher (one):                        Receivers (many):
//!   SupervisorActor ──► Notifier ──┬────► caller: Supervisor::subscribe()
//!                   (broadcast)    └────► subscriber listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest
//!   items. Frame-heavy channels need a capacity that covers bursts.
//! - **No persistence**: events are lost if nobody is subscribed at send time.
//! - **Sequencing**: `publish()` stamps `seq` from a counter owned by this notifier,
//!   so sequences of distinct supervisors are independent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for supervisor events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Notifier {
    /// Creates a notifier with the given ring capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps the next sequence number and publishes to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receivers_see_events_after_subscribe() {
        let n = Notifier::new(4);
        n.publish(Event::new("s", EventKind::ProcessStopped));

        let mut rx = n.subscribe();
        assert_eq!(n.receiver_count(), 1);
        n.publish(Event::new("s", EventKind::ProcessSpawned { pid: Some(7), attempt: 0 }));

        let ev = rx.recv().await.expect("event");
        assert!(matches!(ev.kind, EventKind::ProcessSpawned { pid: Some(7), .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lagging_receiver() {
        let n = Notifier::new(1);
        let mut rx = n.subscribe();
        n.publish(Event::new("s", EventKind::ProcessStopped));
        n.publish(Event::new("s", EventKind::ProcessStopped));
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
    }

    #[tokio::test]
    async fn test_seq_is_per_notifier() {
        let a = Notifier::new(8);
        let b = Notifier::new(8);
        let mut rx_a = a.subscribe();
        let mut rx_b = b.subscribe();

        a.publish(Event::new("a", EventKind::ProcessStopped));
        a.publish(Event::new("a", EventKind::ProcessStopped));
        b.publish(Event::new("b", EventKind::ProcessStopped));

        let first = rx_a.recv().await.expect("event");
        let second = rx_a.recv().await.expect("event");
        assert_eq!((first.seq, second.seq), (0, 1));
        assert_eq!(rx_b.recv().await.expect("event").seq, 0);
    }
}
