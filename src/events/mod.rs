//! Supervisor events: types and broadcast notifier.
//!
//! This module groups the event **data model** and the **notifier** used to
//! publish/subscribe to events emitted by a supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`LifecycleEvent`], [`LifecycleKind`] the unified lifecycle-error record
//! - [`Notifier`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: the supervisor actor (data, spawn/stop, lifecycle records).
//! - **Consumers**: callers via `Supervisor::subscribe()`, and the subscriber
//!   listener feeding the [`SubscriberSet`](crate::SubscriberSet).

mod event;
mod notifier;

pub use event::{Event, EventKind, LifecycleEvent, LifecycleKind};
pub use notifier::Notifier;
