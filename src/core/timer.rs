//! # RestartTimer: the owned, cancellable deferred-spawn handle.
//!
//! The timer is a plain value owned by the supervisor actor and polled from its
//! `select!` loop. Cancelling drops the sleep; since the actor handles one event
//! at a time, a cancelled timer can never fire afterwards.
//!
//! ## Rules
//! - At most one restart is pending (scheduling replaces the previous one)
//! - `cancel()` is idempotent
//! - `fired()` never completes while idle

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Sleep};

#[derive(Debug, Default)]
pub(crate) struct RestartTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl RestartTimer {
    /// Arms the timer to fire after `delay`.
    pub fn schedule(&mut self, delay: Duration) {
        self.sleep = Some(Box::pin(time::sleep(delay)));
    }

    /// Disarms the timer. Returns whether a restart was pending.
    pub fn cancel(&mut self) -> bool {
        self.sleep.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.sleep.is_some()
    }

    /// Completes once the armed delay elapses, disarming the timer.
    ///
    /// Cancel-safe: dropping the future leaves the timer armed.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut timer = RestartTimer::default();
        timer.schedule(Duration::from_secs(5));
        assert!(timer.is_pending());

        let start = time::Instant::now();
        timer.fired().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = RestartTimer::default();
        timer.schedule(Duration::from_secs(1));
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let fired = time::timeout(Duration::from_secs(10), timer.fired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces() {
        let mut timer = RestartTimer::default();
        timer.schedule(Duration::from_secs(100));
        timer.schedule(Duration::from_secs(1));

        let fired = time::timeout(Duration::from_secs(2), timer.fired()).await;
        assert!(fired.is_ok());
    }
}
