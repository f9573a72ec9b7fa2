//! # Watchdog: respawn decisions with a bounded, self-healing attempt counter.
//!
//! [`Watchdog`] is a pure state machine. It is told *when* the process exited
//! and answers *what to do about it*; it owns no timers and no processes.
//!
//! ## Decision flow
//! ```text
//! on_exit(now)
//!   ├─ retry == 0                          → Report     (never respawn)
//!   └─ retry  > 0
//!        ├─ last exit more than wait+reset ago and attempts > 0
//!        │      → attempts = 0            (process ran healthily in between)
//!        ├─ last = now
//!        ├─ attempts < retry              → attempts += 1, Respawn { delay: wait }
//!        └─ attempts == retry             → Exhausted
//! ```
//!
//! ## Rules
//! - `attempts` never exceeds `retry`
//! - [`Watchdog::reset`] clears both the counter and the last-exit timestamp
//! - Exit codes play no part in the decision

use std::time::Duration;

use tokio::time::Instant;

use crate::config::Config;

/// What the supervisor should do after a classified exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Retries are disabled: report the exit, schedule nothing.
    Report,
    /// Schedule a respawn after `delay`; `attempt` is the new counter value.
    Respawn { attempt: u32, delay: Duration },
    /// The counter reached the limit: report terminal failure, schedule nothing.
    Exhausted { attempts: u32 },
}

/// Attempt counter and last-exit memory across the lifetime of one supervisor.
#[derive(Debug, Clone)]
pub struct Watchdog {
    retry: u32,
    wait: Duration,
    reset: Duration,
    last_exit: Option<Instant>,
    attempts: u32,
}

impl Watchdog {
    /// Creates a watchdog with a zeroed counter.
    pub fn new(retry: u32, wait: Duration, reset: Duration) -> Self {
        Self {
            retry,
            wait,
            reset,
            last_exit: None,
            attempts: 0,
        }
    }

    /// Creates a watchdog from validated settings.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.retry_limit(), cfg.wait(), cfg.reset())
    }

    /// Classifies one observed exit at time `now`.
    pub fn on_exit(&mut self, now: Instant) -> ExitDecision {
        if self.retry == 0 {
            return ExitDecision::Report;
        }

        if let Some(last) = self.last_exit {
            let elapsed = now.saturating_duration_since(last);
            if elapsed > self.wait + self.reset && self.attempts > 0 {
                self.attempts = 0;
            }
        }
        self.last_exit = Some(now);

        if self.attempts < self.retry {
            self.attempts += 1;
            ExitDecision::Respawn {
                attempt: self.attempts,
                delay: self.wait,
            }
        } else {
            ExitDecision::Exhausted {
                attempts: self.attempts,
            }
        }
    }

    /// Forgets all failures (explicit start/stop by the caller).
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.last_exit = None;
    }

    /// Current attempt counter.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Timestamp of the last classified exit.
    pub fn last_exit(&self) -> Option<Instant> {
        self.last_exit
    }

    /// Retry limit.
    pub fn retry_limit(&self) -> u32 {
        self.retry
    }

    /// Respawn delay.
    pub fn wait(&self) -> Duration {
        self.wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog(retry: u32) -> Watchdog {
        Watchdog::new(retry, Duration::from_secs(10), Duration::from_secs(20))
    }

    #[test]
    fn test_retry_zero_always_reports() {
        let mut w = dog(0);
        let t0 = Instant::now();
        for i in 0..5 {
            assert_eq!(w.on_exit(t0 + Duration::from_secs(i)), ExitDecision::Report);
        }
        assert_eq!(w.attempts(), 0);
        assert!(w.last_exit().is_none());
    }

    #[test]
    fn test_fast_exits_exhaust_after_limit() {
        let mut w = dog(3);
        let t0 = Instant::now();

        let mut respawns = 0;
        for i in 0..3 {
            match w.on_exit(t0 + Duration::from_secs(i)) {
                ExitDecision::Respawn { attempt, delay } => {
                    respawns += 1;
                    assert_eq!(attempt, respawns);
                    assert_eq!(delay, Duration::from_secs(10));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(respawns, 3);
        assert_eq!(
            w.on_exit(t0 + Duration::from_secs(4)),
            ExitDecision::Exhausted { attempts: 3 }
        );
        assert!(w.attempts() <= w.retry_limit());
    }

    #[test]
    fn test_long_gap_resets_counter_even_at_limit() {
        let mut w = dog(2);
        let t0 = Instant::now();
        w.on_exit(t0);
        w.on_exit(t0 + Duration::from_secs(1));
        assert_eq!(w.attempts(), 2);

        // 31s > wait(10) + reset(20)
        let decision = w.on_exit(t0 + Duration::from_secs(32));
        assert_eq!(
            decision,
            ExitDecision::Respawn {
                attempt: 1,
                delay: Duration::from_secs(10)
            }
        );
    }

    #[test]
    fn test_gap_equal_to_window_does_not_reset() {
        let mut w = dog(1);
        let t0 = Instant::now();
        w.on_exit(t0);
        assert_eq!(
            w.on_exit(t0 + Duration::from_secs(30)),
            ExitDecision::Exhausted { attempts: 1 }
        );
    }

    #[test]
    fn test_exhausted_recovers_after_healthy_run() {
        let mut w = dog(1);
        let t0 = Instant::now();
        w.on_exit(t0);
        assert!(matches!(
            w.on_exit(t0 + Duration::from_secs(1)),
            ExitDecision::Exhausted { .. }
        ));
        assert!(matches!(
            w.on_exit(t0 + Duration::from_secs(100)),
            ExitDecision::Respawn { attempt: 1, .. }
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut w = dog(2);
        let t0 = Instant::now();
        w.on_exit(t0);
        w.reset();
        assert_eq!(w.attempts(), 0);
        assert!(w.last_exit().is_none());
        assert!(matches!(
            w.on_exit(t0 + Duration::from_secs(1)),
            ExitDecision::Respawn { attempt: 1, .. }
        ));
    }
}
