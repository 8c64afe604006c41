use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::params::GenerationParameters;

/// Opaque job identity issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::TimedOut => "TimedOut",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation request tracked from submission to terminal outcome.
///
/// Fields are read-only outside this module. The only mutations are the
/// `complete`, `fail` and `time_out` transitions, each of which is accepted
/// only while the job is still `Pending`, so state never moves backwards and
/// `artifact_url` / `failure_reason` are set exactly for `Completed` / `Failed`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    id: JobId,
    parameters: GenerationParameters,
    state: JobState,
    artifact_url: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    last_polled_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: JobId, parameters: GenerationParameters) -> Self {
        Self {
            id,
            parameters,
            state: JobState::Pending,
            artifact_url: None,
            failure_reason: None,
            created_at: Utc::now(),
            last_polled_at: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.parameters.prompt
    }

    pub fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_polled_at(&self) -> Option<DateTime<Utc>> {
        self.last_polled_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Records that a status snapshot was received, whether or not it changed anything.
    pub fn mark_polled(&mut self, at: DateTime<Utc>) {
        if !self.is_terminal() {
            self.last_polled_at = Some(at);
        }
    }

    /// Returns `true` if the transition was applied.
    pub fn complete(&mut self, artifact_url: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = JobState::Completed;
        self.artifact_url = Some(artifact_url.into());
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = JobState::Failed;
        self.failure_reason = Some(reason.into());
        true
    }

    pub fn time_out(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = JobState::TimedOut;
        true
    }

    /// Notification payload describing the current state
    pub fn update(&self) -> JobUpdate {
        JobUpdate {
            job_id: self.id.clone(),
            state: self.state,
            artifact_url: self.artifact_url.clone(),
            failure_reason: self.failure_reason.clone(),
        }
    }
}

/// State-change notification delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub job_id: JobId,
    pub state: JobState,
    pub artifact_url: Option<String>,
    pub failure_reason: Option<String>,
}
