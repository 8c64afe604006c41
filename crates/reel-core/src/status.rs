//! Normalization of provider-reported raw states into [`JobState`](crate::JobState) outcomes.

/// Reason recorded when the provider reports a failure without explaining it
pub const DEFAULT_FAILURE_REASON: &str = "generation failed";

/// What a single status snapshot means for a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// Still in progress
    Pending,
    Completed { artifact_url: String },
    Failed { reason: String },
    /// Snapshot could not be mapped. The job is treated as still pending.
    Anomaly(Anomaly),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    UnrecognizedState(String),
    MissingArtifact,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedState(raw) => write!(f, "unrecognized provider state '{}'", raw),
            Self::MissingArtifact => f.write_str("completed without an artifact url"),
        }
    }
}

/// Maps a raw provider state plus its optional payload fields.
///
/// Only `pending`, `completed` and `failed` (case-insensitive) are recognized.
/// Anything else is an anomaly rather than an error, so newer provider
/// phases keep the job waiting instead of breaking it.
pub fn interpret(
    raw_state: &str,
    artifact_url: Option<&str>,
    failure_reason: Option<&str>,
) -> Interpretation {
    let normalized = raw_state.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "pending" => Interpretation::Pending,
        "completed" => match artifact_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Interpretation::Completed { artifact_url: url.to_string() },
            None => Interpretation::Anomaly(Anomaly::MissingArtifact),
        },
        "failed" => {
            let reason = failure_reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_FAILURE_REASON);
            Interpretation::Failed { reason: reason.to_string() }
        }
        _ => Interpretation::Anomaly(Anomaly::UnrecognizedState(raw_state.to_string())),
    }
}
