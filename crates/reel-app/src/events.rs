use reel_core::JobUpdate;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Receiver of job state-change notifications.
///
/// Updates for one job arrive in order and never concurrently. Delivery runs
/// on whichever task produced the update, with no manager lock held, so a
/// callback may subscribe or unsubscribe but should hand heavy work off
/// rather than block.
pub trait JobListener: Send + Sync {
    fn on_update(&self, update: &JobUpdate) -> anyhow::Result<()>;
}

impl<F> JobListener for F
where
    F: Fn(&JobUpdate) -> anyhow::Result<()> + Send + Sync,
{
    fn on_update(&self, update: &JobUpdate) -> anyhow::Result<()> {
        self(update)
    }
}

/// Forwards updates into an async channel
pub struct ChannelListener {
    tx: UnboundedSender<JobUpdate>,
}

impl ChannelListener {
    pub fn new(tx: UnboundedSender<JobUpdate>) -> Self {
        Self { tx }
    }
}

impl JobListener for ChannelListener {
    fn on_update(&self, update: &JobUpdate) -> anyhow::Result<()> {
        self.tx
            .send(update.clone())
            .map_err(|_| anyhow::anyhow!("Receiver for job {} dropped", update.job_id))
    }
}

/// Writes every notification to the log
#[derive(Debug, Default)]
pub struct LogListener;

impl JobListener for LogListener {
    fn on_update(&self, update: &JobUpdate) -> anyhow::Result<()> {
        info!(
            job_id = %update.job_id,
            state = %update.state,
            artifact_url = update.artifact_url.as_deref().unwrap_or("-"),
            "Job status update"
        );
        Ok(())
    }
}
