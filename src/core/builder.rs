use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use super::supervisor::Supervisor;
use crate::{
    config::Config,
    error::ConfigError,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Supervisor`] with callback subscribers.
pub struct SupervisorBuilder {
    argv: Vec<String>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    pub(crate) fn new(argv: Vec<String>, cfg: Config) -> Self {
        Self {
            argv,
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor and starts forwarding events to the subscribers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Supervisor, ConfigError> {
        let sup = Supervisor::new(self.argv, self.cfg)?;
        if !self.subscribers.is_empty() {
            subscriber_listener(&sup, SubscriberSet::new(self.subscribers));
        }
        Ok(sup)
    }
}

/// Forwards notifier events to the subscriber set until the actor is gone.
fn subscriber_listener(sup: &Supervisor, set: SubscriberSet) {
    let mut rx = sup.notifier().subscribe();
    let name = sup.name().to_string();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(supervisor = %name, skipped = n, "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
