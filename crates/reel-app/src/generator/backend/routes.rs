use std::sync::Arc;
use axum::Router;
use axum::routing::{get, post};
use crate::generator::backend::routes::job::{
    cancel_job, create_job, get_job, job_events, job_status, list_jobs, remove_job, resume_job,
};
use crate::generator::backend::state::GenState;

mod job;

pub fn api_routes() -> Router<Arc<GenState>> {
    Router::new()
        .route("/api/generate", post(create_job))
        .route("/api/status", get(job_status))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/{id}", get(get_job).delete(remove_job))
        .route("/api/jobs/{id}/cancel", post(cancel_job))
        .route("/api/jobs/{id}/resume", post(resume_job))
        .route("/api/jobs/{id}/events", get(job_events))
}
