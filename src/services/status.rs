// src/services/status.rs

//! Latest-value status channel for update cycles.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{StatusKind, StatusMessages, UpdateStatus};

/// Publishes the last known phase of the update cycle.
///
/// Cloned handles share one slot; a newer status overwrites the older one
/// whether or not anybody has seen it.
#[derive(Clone)]
pub struct StatusReporter {
    sender: Arc<watch::Sender<UpdateStatus>>,
    messages: Arc<StatusMessages>,
}

impl StatusReporter {
    pub fn new(messages: StatusMessages) -> Self {
        let (sender, _) = watch::channel(UpdateStatus::idle());
        Self {
            sender: Arc::new(sender),
            messages: Arc::new(messages),
        }
    }

    /// Publish the status for `kind` with its configured label.
    pub fn report(&self, kind: StatusKind) {
        self.publish(UpdateStatus::new(kind, &self.messages));
    }

    pub fn publish(&self, status: UpdateStatus) {
        self.sender.send_replace(status);
    }

    /// Most recently published status.
    pub fn current(&self) -> UpdateStatus {
        self.sender.borrow().clone()
    }

    /// Receiver that observes the most recent status.
    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.sender.subscribe()
    }

    /// Invoke `callback` for every status change until all reporters are dropped.
    ///
    /// Intermediate values published faster than the callback runs are
    /// skipped; the callback always sees the latest one.
    pub fn on_change<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(&UpdateStatus) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let status = receiver.borrow_and_update().clone();
                callback(&status);
            }
        })
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(StatusMessages::default())
    }
}
