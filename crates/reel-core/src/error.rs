use thiserror::Error;

/// Rejection of caller-supplied generation input. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Prompt is required")]
    EmptyPrompt,
    #[error("Unsupported {field} value: '{value}'")]
    UnknownValue {
        field: &'static str,
        value: String,
    },
}
