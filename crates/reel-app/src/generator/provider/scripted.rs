use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use reel_core::GenerationParameters;
use crate::error::JobError;
use super::{JobHandle, ProviderClient, StatusSnapshot};

/// In-memory provider replaying a fixed sequence of status responses.
///
/// Handles are issued as `g1`, `g2`, ... Once the script runs out every fetch
/// returns the fallback (a raw `pending` snapshot unless overridden).
pub(crate) struct ScriptedProvider {
    submit_error: Mutex<Option<JobError>>,
    script: Mutex<VecDeque<Result<StatusSnapshot, JobError>>>,
    fallback: Mutex<Result<StatusSnapshot, JobError>>,
    latency: Duration,
    submitted: Mutex<Vec<GenerationParameters>>,
    submits: AtomicUsize,
    fetches: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            submit_error: Mutex::new(None),
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(StatusSnapshot::new("pending"))),
            latency: Duration::ZERO,
            submitted: Mutex::new(Vec::new()),
            submits: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn then(self, response: Result<StatusSnapshot, JobError>) -> Self {
        self.script.lock().push_back(response);
        self
    }

    pub fn otherwise(self, response: Result<StatusSnapshot, JobError>) -> Self {
        *self.fallback.lock() = response;
        self
    }

    pub fn failing_submit(self, error: JobError) -> Self {
        *self.submit_error.lock() = Some(error);
        self
    }

    /// Every fetch takes this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn submitted(&self) -> Vec<GenerationParameters> {
        self.submitted.lock().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn submit(&self, params: &GenerationParameters) -> Result<JobHandle, JobError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.submit_error.lock().clone() {
            return Err(err);
        }
        self.submitted.lock().push(params.clone());
        Ok(JobHandle::new(format!("g{}", n)))
    }

    async fn fetch_status(&self, _handle: &JobHandle) -> Result<StatusSnapshot, JobError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.lock().clone())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}
