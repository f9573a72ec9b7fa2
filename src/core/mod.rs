//! Runtime core: process lifecycle and channel wiring.
//!
//! The public surface is [`Supervisor`] (plus its builder and [`Status`]).
//!
//! Internal modules:
//! - [`actor`]: the single-threaded loop that owns all mutable state;
//! - [`process`]: spawning, killing and exit classification;
//! - [`router`]: per-spawn channel readers, input writer and demux pipelines;
//! - [`timer`]: the cancellable restart timer;
//! - [`supervisor`] / [`builder`]: the cloneable handle and its construction.

mod actor;
mod builder;
mod process;
mod router;
mod supervisor;
mod timer;

pub use actor::Status;
pub use builder::SupervisorBuilder;
pub use process::ExitReport;
pub use supervisor::{Supervisor, MIN_PARAMS};
