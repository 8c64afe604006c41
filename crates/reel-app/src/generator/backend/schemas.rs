use reel_core::{Job, JobId, JobState};
use serde::{Deserialize, Serialize};

pub use reel_core::GenerationRequest;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobCreateResponse {
    pub job_id: JobId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    #[serde(alias = "id")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub state: JobState,
    pub artifact_url: Option<String>,
    pub failure_reason: Option<String>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            state: job.state(),
            artifact_url: job.artifact_url().map(str::to_string),
            failure_reason: job.failure_reason().map(str::to_string),
        }
    }
}

/// Full job record plus whether it is still being polled
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    pub polling: bool,
}
