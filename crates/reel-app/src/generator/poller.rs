use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use parking_lot::Mutex;
use reel_core::{Interpretation, Job, JobId};
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::error::JobError;
use crate::generator::provider::{JobHandle, ProviderClient, StatusSnapshot};
use crate::generator::subscribers::{Delivery, SubscriberRegistry};
use crate::generator::ManagerConfig;

/// Authoritative per-job state held by the manager
pub(crate) struct JobEntry {
    handle: JobHandle,
    record: Mutex<Job>,
    outbox: Mutex<Outbox>,
    polling: Mutex<PollState>,
}

// Deliveries for one job run in queue order, by one thread at a time, with no lock held
#[derive(Default)]
struct Outbox {
    queue: VecDeque<Delivery>,
    draining: bool,
}

#[derive(Default)]
struct PollState {
    generation: u64,
    token: Option<CancellationToken>,
    finished_at: Option<Instant>,
}

impl JobEntry {
    pub fn new(handle: JobHandle, job: Job) -> Self {
        Self {
            handle,
            record: Mutex::new(job),
            outbox: Mutex::new(Outbox::default()),
            polling: Mutex::new(PollState::default()),
        }
    }

    pub fn id(&self) -> &JobId {
        self.handle.id()
    }

    pub fn snapshot(&self) -> Job {
        self.record.lock().clone()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.lock().token.is_some()
    }

    /// Terminal and no longer polled, for at least `retention`
    pub fn is_released(&self, retention: Duration, now: Instant) -> bool {
        if !self.record.lock().is_terminal() {
            return false;
        }
        let polling = self.polling.lock();
        polling.token.is_none()
            && polling
                .finished_at
                .is_some_and(|finished| finished + retention <= now)
    }

    /// Runs `stage` against the record and queues the delivery it returns.
    ///
    /// Staging is atomic with respect to other notifications for this job, so
    /// the queue order matches the order in which the record changed. The
    /// queue is then drained on the calling thread unless another thread is
    /// already draining it.
    pub fn notify<T>(&self, stage: impl FnOnce(&mut Job) -> (T, Option<Delivery>)) -> T {
        let (out, drain) = {
            let mut outbox = self.outbox.lock();
            let mut job = self.record.lock();
            let (out, delivery) = stage(&mut *job);
            drop(job);
            let drain = match delivery {
                Some(delivery) => {
                    outbox.queue.push_back(delivery);
                    !std::mem::replace(&mut outbox.draining, true)
                }
                None => false,
            };
            (out, drain)
        };

        if drain {
            self.drain();
        }
        out
    }

    fn drain(&self) {
        loop {
            let delivery = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            delivery.run();
        }
    }

    /// Starts a new polling generation. Returns `None` if one is already running.
    fn begin_polling(&self) -> Option<(u64, CancellationToken)> {
        let mut polling = self.polling.lock();
        if polling.token.is_some() {
            return None;
        }
        polling.generation += 1;
        let token = CancellationToken::new();
        polling.token = Some(token.clone());
        Some((polling.generation, token))
    }

    /// Stops the current polling generation. Once this returns, no in-flight
    /// poll result can be applied to the record.
    pub fn stop_polling(&self) -> bool {
        // Taking the record lock orders cancellation against an in-progress apply
        let _record = self.record.lock();
        match self.polling.lock().token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn mark_finished(&self) {
        self.polling.lock().finished_at = Some(Instant::now());
    }

    fn release(&self, generation: u64) {
        let mut polling = self.polling.lock();
        if polling.generation == generation {
            polling.token = None;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Tick {
    Continue,
    Stop,
}

/// Polling loop for one job. Exactly one status request is outstanding at a time.
pub(crate) struct Poller {
    entry: Arc<JobEntry>,
    provider: Arc<dyn ProviderClient>,
    subscribers: Arc<SubscriberRegistry>,
    config: ManagerConfig,
    generation: u64,
    token: CancellationToken,
    deadline: Instant,
}

impl Poller {
    /// Returns `None` if the entry is already being polled
    pub fn new(
        entry: Arc<JobEntry>,
        provider: Arc<dyn ProviderClient>,
        subscribers: Arc<SubscriberRegistry>,
        config: ManagerConfig,
        started: Instant,
    ) -> Option<Self> {
        let (generation, token) = entry.begin_polling()?;
        Some(Self {
            entry,
            provider,
            subscribers,
            deadline: started + config.polling_budget,
            config,
            generation,
            token,
        })
    }

    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    pub async fn run(self) {
        let job_id = self.entry.id().clone();
        debug!(%job_id, generation = self.generation, "Polling started");

        let mut next_poll = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = sleep_until(next_poll.min(self.deadline)) => {}
            }

            if Instant::now() >= self.deadline {
                self.expire();
                break;
            }

            let request = timeout(
                self.config.request_timeout,
                self.provider.fetch_status(&self.entry.handle),
            );
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = sleep_until(self.deadline) => {
                    self.expire();
                    break;
                }
                result = request => result.unwrap_or_else(|_| {
                    Err(JobError::Transient("Status request timed out".into()))
                }),
            };

            match self.apply(result) {
                Tick::Continue => next_poll = Instant::now() + self.config.poll_interval,
                Tick::Stop => break,
            }
        }

        self.entry.release(self.generation);
        debug!(%job_id, generation = self.generation, "Polling stopped");
    }

    fn apply(&self, result: Result<StatusSnapshot, JobError>) -> Tick {
        let job_id = self.entry.id();
        match result {
            Ok(snapshot) => {
                if !self.touch() {
                    return Tick::Stop;
                }
                match snapshot.interpret() {
                    Interpretation::Pending => Tick::Continue,
                    Interpretation::Anomaly(anomaly) => {
                        warn!(%job_id, raw_state = %snapshot.raw_state, "Status anomaly: {}", anomaly);
                        Tick::Continue
                    }
                    Interpretation::Completed { artifact_url } => {
                        self.commit(|job| job.complete(artifact_url));
                        Tick::Stop
                    }
                    Interpretation::Failed { reason } => {
                        self.commit(|job| job.fail(reason));
                        Tick::Stop
                    }
                }
            }
            Err(JobError::NotFound(_)) => {
                let reason = format!("Generation {} is unknown to the provider", job_id);
                self.commit(|job| job.fail(reason));
                Tick::Stop
            }
            Err(e) if e.is_transient() => {
                debug!(%job_id, "Missed poll tick: {}", e);
                Tick::Continue
            }
            Err(e) => {
                warn!(%job_id, "Status request rejected, retrying next tick: {}", e);
                Tick::Continue
            }
        }
    }

    fn expire(&self) {
        if self.commit(|job| job.time_out()) {
            warn!(
                job_id = %self.entry.id(),
                budget_secs = self.config.polling_budget.as_secs(),
                "Polling budget exhausted"
            );
        }
    }

    fn touch(&self) -> bool {
        let mut job = self.entry.record.lock();
        if self.token.is_cancelled() {
            return false;
        }
        job.mark_polled(Utc::now());
        true
    }

    /// Applies a transition and broadcasts it. Nothing is applied once the
    /// token is cancelled.
    fn commit(&self, change: impl FnOnce(&mut Job) -> bool) -> bool {
        let update = self.entry.notify(|job| {
            if self.token.is_cancelled() || !change(job) {
                return (None, None);
            }
            if job.is_terminal() {
                self.entry.mark_finished();
            }
            let update = job.update();
            let delivery = Delivery::new(self.subscribers.targets(&update.job_id), update.clone());
            (Some(update), Some(delivery))
        });

        match update {
            Some(update) => {
                info!(job_id = %update.job_id, state = %update.state, "Job state changed");
                true
            }
            None => false,
        }
    }
}
