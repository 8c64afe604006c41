use std::sync::Arc;
use futures::Stream;
use reel_core::{JobId, JobUpdate};
use tokio::sync::mpsc::UnboundedReceiver;
use crate::generator::subscribers::{SubscriberRegistry, SubscriptionId};

/// Channel-backed subscription to one job.
///
/// The first update is the job's state at subscription time. Dropping the
/// watch unsubscribes.
pub struct JobWatch {
    updates: UnboundedReceiver<JobUpdate>,
    registry: Arc<SubscriberRegistry>,
    job_id: JobId,
    subscription: SubscriptionId,
}

impl JobWatch {
    pub(crate) fn new(
        updates: UnboundedReceiver<JobUpdate>,
        registry: Arc<SubscriberRegistry>,
        job_id: JobId,
        subscription: SubscriptionId,
    ) -> Self {
        Self {
            updates,
            registry,
            job_id,
            subscription,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub async fn recv(&mut self) -> Option<JobUpdate> {
        self.updates.recv().await
    }

    pub fn try_recv(&mut self) -> Option<JobUpdate> {
        self.updates.try_recv().ok()
    }

    /// Stream of updates that ends after the first terminal state
    pub fn into_stream(self) -> impl Stream<Item = JobUpdate> + Send + 'static {
        futures::stream::unfold((self, false), |(mut watch, finished)| async move {
            if finished {
                return None;
            }
            let update = watch.recv().await?;
            let finished = update.state.is_terminal();
            Some((update, (watch, finished)))
        })
    }
}

impl Drop for JobWatch {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.job_id, self.subscription);
    }
}
