pub mod error;
pub mod job;
mod model_types;
pub mod params;
pub mod status;

pub use error::ValidationError;
pub use job::{Job, JobId, JobState, JobUpdate};
pub use model_types::{AspectRatio, ClipDuration, VideoModel};
pub use params::{GenerationParameters, GenerationRequest};
pub use status::{interpret, Anomaly, Interpretation};
