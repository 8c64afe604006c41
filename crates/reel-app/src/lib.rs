//! Asynchronous video generation jobs: submission to a remote provider,
//! scheduled status polling, and state-change fan-out to subscribers.

pub mod config;
pub mod error;
pub mod events;
pub mod generator;

pub use error::{ApiError, JobError};
pub use events::{ChannelListener, JobListener, LogListener};
pub use generator::provider::{JobHandle, LumaClient, ProviderClient, StatusSnapshot};
pub use generator::subscribers::{SubscriberRegistry, SubscriptionId};
pub use generator::watch::JobWatch;
pub use generator::{JobManager, ManagerConfig};
