use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use parking_lot::Mutex;
use reel_core::{JobId, JobUpdate};
use tracing::warn;
use uuid::Uuid;
use crate::events::JobListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

pub(crate) type Target = (SubscriptionId, Arc<dyn JobListener>);

/// Fan-out of job notifications to registered listeners.
///
/// The registry only routes. It never reads or mutates job records, and it
/// holds no lock while a listener runs, so listeners may subscribe or
/// unsubscribe from inside a callback.
#[derive(Default)]
pub struct SubscriberRegistry {
    listeners: Mutex<HashMap<JobId, Vec<Target>>>,
    // Receive updates for every job; not counted as job subscribers
    global: Mutex<Vec<Target>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, job_id: &JobId, listener: Arc<dyn JobListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners
            .lock()
            .entry(job_id.clone())
            .or_default()
            .push((id, listener));
        id
    }

    /// Registers a listener for every job, present and future
    pub fn subscribe_all(&self, listener: Arc<dyn JobListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.global.lock().push((id, listener));
        id
    }

    pub fn unsubscribe_all(&self, subscription: SubscriptionId) -> bool {
        let mut global = self.global.lock();
        let before = global.len();
        global.retain(|(id, _)| *id != subscription);
        global.len() != before
    }

    /// Returns `true` if the subscription existed
    pub fn unsubscribe(&self, job_id: &JobId, subscription: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(job_id) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|(id, _)| *id != subscription);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(job_id);
        }
        removed
    }

    /// Drops every subscription for a job
    pub fn remove_job(&self, job_id: &JobId) -> usize {
        self.listeners
            .lock()
            .remove(job_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.listeners
            .lock()
            .get(job_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Listeners of the job followed by global listeners, as registered right now
    pub(crate) fn targets(&self, job_id: &JobId) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .listeners
            .lock()
            .get(job_id)
            .cloned()
            .unwrap_or_default();
        targets.extend(self.global_targets());
        targets
    }

    pub(crate) fn global_targets(&self) -> Vec<Target> {
        self.global.lock().clone()
    }
}

/// An update bound to the listeners that were registered when it was produced
pub(crate) struct Delivery {
    targets: Vec<Target>,
    update: JobUpdate,
}

impl Delivery {
    pub fn new(targets: Vec<Target>, update: JobUpdate) -> Self {
        Self { targets, update }
    }

    /// Calls every target in order. A failing or panicking listener is logged
    /// and skipped. Returns the number of successful deliveries.
    pub fn run(&self) -> usize {
        self.targets
            .iter()
            .filter(|(id, listener)| deliver(*id, listener.as_ref(), &self.update))
            .count()
    }
}

fn deliver(id: SubscriptionId, listener: &dyn JobListener, update: &JobUpdate) -> bool {
    match catch_unwind(AssertUnwindSafe(|| listener.on_update(update))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(job_id = %update.job_id, subscription = ?id, "Listener failed: {:#}", e);
            false
        }
        Err(_) => {
            warn!(job_id = %update.job_id, subscription = ?id, "Listener panicked");
            false
        }
    }
}
