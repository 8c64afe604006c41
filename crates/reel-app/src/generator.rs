use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::RwLock;
use reel_core::{GenerationParameters, Job, JobId};
use tokio::runtime::Handle;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::error::JobError;
use crate::events::{ChannelListener, JobListener};
use crate::generator::poller::{JobEntry, Poller};
use crate::generator::provider::ProviderClient;
use crate::generator::subscribers::{Delivery, SubscriberRegistry, SubscriptionId};
use crate::generator::watch::JobWatch;

pub mod backend;
mod poller;
pub mod provider;
pub mod subscribers;
pub mod watch;

const SWEEP_PERIOD: Duration = Duration::from_secs(30);

type JobTable = Arc<RwLock<HashMap<JobId, Arc<JobEntry>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Delay between the completion of one status request and the next
    pub poll_interval: Duration,
    /// Wall-clock limit on how long a job may stay pending
    pub polling_budget: Duration,
    /// Upper bound on a single provider call
    pub request_timeout: Duration,
    /// How long a finished job with no subscribers stays queryable
    pub retention: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            polling_budget: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(20),
            retention: Duration::from_secs(10 * 60),
        }
    }
}

/// Job lifecycle manager.
///
/// Owns every job record, runs one polling task per active job and routes
/// state changes to subscribers. Errors from the polling phase are absorbed
/// into job state; only submission errors reach callers.
///
/// Finished jobs that nobody subscribes to are released by a background
/// sweep once `retention` has passed.
pub struct JobManager {
    provider: Arc<dyn ProviderClient>,
    config: ManagerConfig,
    jobs: JobTable,
    subscribers: Arc<SubscriberRegistry>,
    sweeper: CancellationToken,
}

impl JobManager {
    pub fn new(provider: Arc<dyn ProviderClient>, config: ManagerConfig) -> Self {
        let manager = Self {
            provider,
            config,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            subscribers: Arc::new(SubscriberRegistry::new()),
            sweeper: CancellationToken::new(),
        };
        spawn_sweeper(
            manager.jobs.clone(),
            manager.subscribers.clone(),
            config.retention,
            manager.sweeper.clone(),
        );
        manager
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Validates, submits and starts polling. No job is recorded unless the
    /// provider accepted the submission.
    pub async fn start_job(&self, params: GenerationParameters) -> Result<JobId, JobError> {
        let requested_duration = params.duration;
        let params = params.into_submission()?;
        if requested_duration.is_some() && params.duration.is_none() {
            debug!(model = %params.model, "Dropping duration unsupported by model");
        }

        let handle = timeout(self.config.request_timeout, self.provider.submit(&params))
            .await
            .map_err(|_| JobError::Transient("Submission timed out".into()))??;

        let started = Instant::now();
        let model = params.model;
        let job_id = handle.id().clone();
        let entry = Arc::new(JobEntry::new(handle, Job::new(job_id.clone(), params)));

        if let Some(previous) = self.jobs.write().insert(job_id.clone(), entry.clone()) {
            warn!(%job_id, "Provider reissued a known job id, replacing record");
            previous.stop_polling();
        }

        info!(
            %job_id,
            provider = self.provider.provider_name(),
            %model,
            "Job submitted"
        );
        // Nobody can have subscribed to the new id yet, so this reaches global listeners only
        entry.notify(|job| {
            let delivery = Delivery::new(self.subscribers.global_targets(), job.update());
            ((), Some(delivery))
        });

        self.start_polling(entry, started);
        Ok(job_id)
    }

    pub fn get_job(&self, id: &JobId) -> Result<Job, JobError> {
        Ok(self.entry(id)?.snapshot())
    }

    /// All jobs, newest first
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .values()
            .map(|entry| entry.snapshot())
            .collect();
        jobs.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        jobs
    }

    pub fn is_polling(&self, id: &JobId) -> bool {
        self.entry(id).map(|e| e.is_polling()).unwrap_or(false)
    }

    /// Stops polling without contacting the provider. The job keeps its
    /// last-known state. Returns `false` if it was not being polled.
    pub fn cancel(&self, id: &JobId) -> Result<bool, JobError> {
        let stopped = self.entry(id)?.stop_polling();
        if stopped {
            info!(job_id = %id, "Polling cancelled");
        }
        Ok(stopped)
    }

    /// Restarts polling for a pending job that is not currently polled. The
    /// polling budget starts over. Returns `false` when there was nothing to do.
    pub fn resume(&self, id: &JobId) -> Result<bool, JobError> {
        let entry = self.entry(id)?;
        if entry.snapshot().is_terminal() {
            return Ok(false);
        }
        let resumed = self.start_polling(entry, Instant::now());
        if resumed {
            info!(job_id = %id, "Polling resumed");
        }
        Ok(resumed)
    }

    /// Registers a listener. Its first update is the job's current state,
    /// followed by every later change in order.
    pub fn subscribe(
        &self,
        id: &JobId,
        listener: Arc<dyn JobListener>,
    ) -> Result<SubscriptionId, JobError> {
        let entry = self.entry(id)?;
        let subscription = entry.notify(|job| {
            let subscription = self.subscribers.subscribe(id, listener.clone());
            let delivery = Delivery::new(vec![(subscription, listener)], job.update());
            (subscription, Some(delivery))
        });
        Ok(subscription)
    }

    pub fn unsubscribe(&self, id: &JobId, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id, subscription)
    }

    /// Registers a listener for every job started from now on
    pub fn subscribe_all(&self, listener: Arc<dyn JobListener>) -> SubscriptionId {
        self.subscribers.subscribe_all(listener)
    }

    pub fn unsubscribe_all(&self, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe_all(subscription)
    }

    /// Channel-backed subscription that unsubscribes when dropped
    pub fn watch(&self, id: &JobId) -> Result<JobWatch, JobError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = self.subscribe(id, Arc::new(ChannelListener::new(tx)))?;
        Ok(JobWatch::new(
            rx,
            self.subscribers.clone(),
            id.clone(),
            subscription,
        ))
    }

    /// Stops polling, drops subscribers and forgets the job
    pub fn remove_job(&self, id: &JobId) -> Result<(), JobError> {
        let entry = self
            .jobs
            .write()
            .remove(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;
        entry.stop_polling();
        self.subscribers.remove_job(id);
        info!(job_id = %id, "Job removed");
        Ok(())
    }

    /// Forgets terminal jobs that are neither polled nor subscribed to, without
    /// waiting for the retention period. Returns the number of jobs removed.
    pub fn clear_finished(&self) -> usize {
        release_finished(&self.jobs, &self.subscribers, Duration::ZERO)
    }

    /// Cancels every active poller and the background sweep
    pub fn shutdown(&self) {
        self.sweeper.cancel();
        let stopped = self
            .jobs
            .read()
            .values()
            .filter(|entry| entry.stop_polling())
            .count();
        info!(stopped, "Job manager shut down");
    }

    fn entry(&self, id: &JobId) -> Result<Arc<JobEntry>, JobError> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    fn start_polling(&self, entry: Arc<JobEntry>, started: Instant) -> bool {
        match Poller::new(
            entry,
            self.provider.clone(),
            self.subscribers.clone(),
            self.config,
            started,
        ) {
            Some(poller) => {
                poller.spawn();
                true
            }
            None => false,
        }
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.sweeper.cancel();
        for entry in self.jobs.read().values() {
            entry.stop_polling();
        }
    }
}

fn release_finished(jobs: &JobTable, subscribers: &SubscriberRegistry, retention: Duration) -> usize {
    let now = Instant::now();
    let mut jobs = jobs.write();
    let before = jobs.len();
    jobs.retain(|id, entry| {
        !(entry.is_released(retention, now) && subscribers.subscriber_count(id) == 0)
    });
    before - jobs.len()
}

fn spawn_sweeper(
    jobs: JobTable,
    subscribers: Arc<SubscriberRegistry>,
    retention: Duration,
    token: CancellationToken,
) {
    let Ok(runtime) = Handle::try_current() else {
        warn!("No async runtime, finished jobs are released only by clear_finished");
        return;
    };

    runtime.spawn(async move {
        let mut ticker = interval(SWEEP_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let released = release_finished(&jobs, &subscribers, retention);
            if released > 0 {
                debug!(released, "Released finished jobs");
            }
        }
    });
}
