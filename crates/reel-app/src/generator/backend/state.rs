use std::sync::Arc;
use crate::generator::JobManager;

pub struct GenState {
    pub(crate) manager: Arc<JobManager>,
}

impl GenState {
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self {
            manager
        }
    }
}
