//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers supervisor events to callback-style handlers.
//!
//! ## Architecture
//! ```text
//! SupervisorActor ── publish(Event) ──► Notifier ──► subscriber listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                                  ┌───────┼────────┐
//!                                                  ▼       ▼        ▼
//!                                              LogWriter  Alerts  Custom
//! ```
//!
//! Callers that prefer a stream can skip this module and use
//! `Supervisor::subscribe()` directly.

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
