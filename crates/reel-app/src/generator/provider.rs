//! Provider client contract
//!
//! The lifecycle manager depends only on [`ProviderClient`]. [`LumaClient`] is the
//! HTTP implementation used by the server; tests substitute a scripted client.

mod luma;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use reel_core::{interpret, GenerationParameters, Interpretation, JobId};
use crate::error::JobError;

pub use luma::{LumaClient, LumaConfig, DEFAULT_LUMA_BASE_URL};

/// Provider-issued reference to a submitted generation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(JobId);

impl JobHandle {
    pub fn new(id: impl Into<JobId>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &JobId {
        &self.0
    }
}

/// Unnormalized status as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub raw_state: String,
    pub artifact_url: Option<String>,
    pub failure_reason: Option<String>,
}

impl StatusSnapshot {
    pub fn new(raw_state: impl Into<String>) -> Self {
        Self {
            raw_state: raw_state.into(),
            artifact_url: None,
            failure_reason: None,
        }
    }

    pub fn with_artifact(mut self, url: impl Into<String>) -> Self {
        self.artifact_url = Some(url.into());
        self
    }

    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn interpret(&self) -> Interpretation {
        interpret(
            &self.raw_state,
            self.artifact_url.as_deref(),
            self.failure_reason.as_deref(),
        )
    }
}

/// Remote generation provider
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Submit a generation request.
    ///
    /// Errors: `Configuration` when credentials are absent, `Validation` for
    /// malformed parameters, `Provider` for a non-2xx response.
    async fn submit(&self, params: &GenerationParameters) -> Result<JobHandle, JobError>;

    /// Fetch the current status of a submitted generation.
    ///
    /// Errors: `NotFound` when the handle is unknown, `Transient` for network
    /// and 5xx conditions, `Provider` otherwise.
    async fn fetch_status(&self, handle: &JobHandle) -> Result<StatusSnapshot, JobError>;

    fn provider_name(&self) -> &str;
}
