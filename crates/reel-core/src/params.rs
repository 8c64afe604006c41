use serde::{Deserialize, Serialize};
use crate::error::ValidationError;
use crate::model_types::{AspectRatio, ClipDuration, VideoModel};

/// Validated inputs for one generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    #[serde(default)]
    pub model: VideoModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<ClipDuration>,
}

impl GenerationParameters {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            looping: false,
            model: VideoModel::default(),
            duration: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_model(mut self, model: VideoModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_duration(mut self, duration: ClipDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        Ok(())
    }

    /// Validates and returns the parameters exactly as they should be sent to the
    /// provider: a duration is dropped for models that do not accept one.
    pub fn into_submission(mut self) -> Result<Self, ValidationError> {
        self.validate()?;
        if !self.model.supports_duration() {
            self.duration = None;
        }
        Ok(self)
    }
}

/// Loosely-typed submission as received at the boundary, before enum parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    pub aspect_ratio: Option<String>,
    #[serde(rename = "loop")]
    pub looping: Option<bool>,
    pub model: Option<String>,
    pub duration: Option<String>,
}

impl TryFrom<GenerationRequest> for GenerationParameters {
    type Error = ValidationError;

    fn try_from(req: GenerationRequest) -> Result<Self, Self::Error> {
        let prompt = req.prompt.unwrap_or_default();
        if prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }

        let aspect_ratio = match req.aspect_ratio.as_deref() {
            Some(raw) => raw.parse()?,
            None => AspectRatio::default(),
        };
        let model = match req.model.as_deref() {
            Some(raw) => raw.parse()?,
            None => VideoModel::default(),
        };
        // An empty duration string is treated as "not requested"
        let duration = match req.duration.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(raw.parse()?),
        };

        Ok(Self {
            prompt,
            aspect_ratio,
            looping: req.looping.unwrap_or(false),
            model,
            duration,
        })
    }
}
