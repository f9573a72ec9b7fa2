//! Respawn policy.
//!
//! This module holds the knob that controls **if/when** an exited process is
//! spawned again.
//!
//! ## Contents
//! - [`Watchdog`]     attempt counter with health-window reset
//! - [`ExitDecision`] report / respawn / exhausted
//!
//! ## Quick wiring
//! ```text
//! Config { retry, wait, reset }
//!      └─► core::actor::SupervisorActor uses:
//!           - watchdog.on_exit(now) to decide after every exit
//!           - watchdog.reset() on explicit start/stop
//! ```

mod watchdog;

pub use watchdog::{ExitDecision, Watchdog};
