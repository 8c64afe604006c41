use std::time::Duration;
use async_trait::async_trait;
use reel_core::GenerationParameters;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::JobError;
use super::{JobHandle, ProviderClient, StatusSnapshot};

pub const DEFAULT_LUMA_BASE_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";

#[derive(Debug, Clone)]
pub struct LumaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for LumaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LUMA_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Luma Dream Machine client
pub struct LumaClient {
    http: Client,
    config: LumaConfig,
}

#[derive(Debug, Serialize)]
struct LumaGenerationRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'static str,
    #[serde(rename = "loop")]
    looping: bool,
    model: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<&'static str>,
}

impl<'a> From<&'a GenerationParameters> for LumaGenerationRequest<'a> {
    fn from(params: &'a GenerationParameters) -> Self {
        Self {
            prompt: &params.prompt,
            aspect_ratio: params.aspect_ratio.id(),
            looping: params.looping,
            model: params.model.id(),
            duration: params.duration.map(|d| d.id()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LumaGeneration {
    id: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    assets: Option<LumaAssets>,
}

#[derive(Debug, Deserialize)]
struct LumaAssets {
    #[serde(default)]
    video: Option<String>,
}

impl LumaClient {
    pub fn new(config: LumaConfig) -> Result<Self, JobError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| JobError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn api_key(&self) -> Result<&str, JobError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| JobError::Configuration("LUMAAI_API_KEY is not defined".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ProviderClient for LumaClient {
    async fn submit(&self, params: &GenerationParameters) -> Result<JobHandle, JobError> {
        params.validate()?;
        let key = self.api_key()?;

        let response = self
            .http
            .post(self.url("generations"))
            .bearer_auth(key)
            .json(&LumaGenerationRequest::from(params))
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let generation = decode(response).await?;
        debug!(id = %generation.id, "Provider accepted generation");
        Ok(JobHandle::new(generation.id))
    }

    async fn fetch_status(&self, handle: &JobHandle) -> Result<StatusSnapshot, JobError> {
        let key = self.api_key()?;

        let response = self
            .http
            .get(self.url(&format!("generations/{}", handle.id())))
            .bearer_auth(key)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_failure(handle, status, &body));
        }

        Ok(decode(response).await?.into())
    }

    fn provider_name(&self) -> &str {
        "luma"
    }
}

impl From<LumaGeneration> for StatusSnapshot {
    fn from(generation: LumaGeneration) -> Self {
        Self {
            raw_state: generation.state.unwrap_or_default(),
            artifact_url: generation.assets.and_then(|a| a.video),
            failure_reason: generation.failure_reason,
        }
    }
}

async fn decode(response: Response) -> Result<LumaGeneration, JobError> {
    response
        .json()
        .await
        .map_err(|e| JobError::Provider(format!("Malformed provider response: {}", e)))
}

fn map_transport_error(error: reqwest::Error) -> JobError {
    JobError::Transient(format!("Request to provider failed: {}", error))
}

fn classify_status_failure(handle: &JobHandle, status: StatusCode, body: &str) -> JobError {
    match status {
        StatusCode::NOT_FOUND => JobError::NotFound(handle.id().clone()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            JobError::Transient(format!("HTTP {}: {}", status, body))
        }
        s if s.is_server_error() => JobError::Transient(format!("HTTP {}: {}", status, body)),
        _ => JobError::Provider(format!("HTTP {}: {}", status, body)),
    }
}
