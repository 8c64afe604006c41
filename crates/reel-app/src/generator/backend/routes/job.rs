use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use reel_core::{GenerationParameters, JobId};
use crate::error::ApiError;
use crate::generator::backend::schemas::{
    GenerationRequest, JobCreateResponse, JobStatusResponse, JobView, StatusQuery,
};
use crate::generator::backend::state::GenState;

pub async fn create_job(
    State(state): State<Arc<GenState>>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<JobCreateResponse>, ApiError> {
    let Json(req) = body?;
    let params = GenerationParameters::try_from(req).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let job_id = state.manager.start_job(params).await?;
    Ok(Json(JobCreateResponse { job_id }))
}

pub async fn job_status(
    State(state): State<Arc<GenState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let id = query
        .job_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Job ID is required"))?;
    let job = state.manager.get_job(&JobId::new(id))?;
    Ok(Json(JobStatusResponse::from(&job)))
}

pub async fn list_jobs(State(state): State<Arc<GenState>>) -> Json<Vec<JobView>> {
    let jobs = state
        .manager
        .list_jobs()
        .into_iter()
        .map(|job| JobView {
            polling: state.manager.is_polling(job.id()),
            job,
        })
        .collect();
    Json(jobs)
}

pub async fn get_job(
    State(state): State<Arc<GenState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let id = JobId::new(id);
    let job = state.manager.get_job(&id)?;
    Ok(Json(JobView {
        polling: state.manager.is_polling(&id),
        job,
    }))
}

pub async fn cancel_job(
    State(state): State<Arc<GenState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.cancel(&JobId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resume_job(
    State(state): State<Arc<GenState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.resume(&JobId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_job(
    State(state): State<Arc<GenState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.remove_job(&JobId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// One `state` event per change, starting with the current state. The stream
/// closes after a terminal state.
pub async fn job_events(
    State(state): State<Arc<GenState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let watch = state.manager.watch(&JobId::new(id))?;
    let events = watch
        .into_stream()
        .map(|update| Event::default().event("state").json_data(update));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use crate::error::JobError;
    use crate::generator::backend::routes::api_routes;
    use crate::generator::provider::scripted::ScriptedProvider;
    use crate::generator::provider::StatusSnapshot;
    use crate::generator::{JobManager, ManagerConfig};
    use super::*;

    fn app(provider: ScriptedProvider) -> (Router, Arc<JobManager>) {
        let manager = Arc::new(JobManager::new(Arc::new(provider), ManagerConfig::default()));
        let router = api_routes().with_state(Arc::new(GenState::new(manager.clone())));
        (router, manager)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_returns_job_id() {
        let (router, manager) = app(ScriptedProvider::new());

        let (status, body) = send(
            &router,
            post_json(
                "/api/generate",
                json!({"prompt": "a calm lake at dawn", "aspectRatio": "16:9", "model": "ray-2", "duration": "5s"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"jobId": "g1"}));
        assert!(manager.get_job(&JobId::new("g1")).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_without_prompt_is_client_error() {
        let (router, manager) = app(ScriptedProvider::new());

        let (status, body) = send(&router, post_json("/api/generate", json!({"model": "ray-2"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is required");
        assert!(manager.list_jobs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_with_unknown_model_is_client_error() {
        let (router, _) = app(ScriptedProvider::new());

        let (status, body) = send(
            &router,
            post_json("/api/generate", json!({"prompt": "forest", "model": "ray-9"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("ray-9"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_provider_failure_is_server_error() {
        let (router, manager) =
            app(ScriptedProvider::new().failing_submit(JobError::Provider("HTTP 400".into())));

        let (status, body) =
            send(&router, post_json("/api/generate", json!({"prompt": "forest"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
        assert!(manager.list_jobs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_query() {
        let (router, manager) = app(ScriptedProvider::new());
        manager
            .start_job(GenerationParameters::new("forest"))
            .await
            .unwrap();

        let (status, body) = send(&router, get("/api/status?jobId=g1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"state": "Pending", "artifactUrl": null, "failureReason": null})
        );

        let (status, _) = send(&router, get("/api/status?id=g1")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_query_errors() {
        let (router, _) = app(ScriptedProvider::new());

        let (status, body) = send(&router, get("/api/status")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Job ID is required");

        let (status, _) = send(&router, get("/api/status?jobId=unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resume_and_remove() {
        let (router, manager) = app(ScriptedProvider::new());
        let id = manager
            .start_job(GenerationParameters::new("forest"))
            .await
            .unwrap();

        let (status, _) = send(&router, post_json("/api/jobs/g1/cancel", json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!manager.is_polling(&id));

        let (status, body) = send(&router, get("/api/jobs/g1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Pending");
        assert_eq!(body["polling"], false);
        assert_eq!(body["parameters"]["prompt"], "forest");

        let (status, _) = send(&router, post_json("/api/jobs/g1/resume", json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(manager.is_polling(&id));

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/jobs/g1")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&router, get("/api/jobs/g1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_jobs() {
        let (router, manager) = app(ScriptedProvider::new());
        manager.start_job(GenerationParameters::new("first")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.start_job(GenerationParameters::new("second")).await.unwrap();

        let (status, body) = send(&router, get("/api/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        let jobs = body.as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j["polling"] == true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_jobs_leave_the_listing() {
        let mut provider = ScriptedProvider::new();
        for n in 0..5 {
            provider = provider.then(Ok(
                StatusSnapshot::new("completed").with_artifact(format!("https://x/{}.mp4", n))
            ));
        }
        let (router, manager) = app(provider);
        for _ in 0..5 {
            manager.start_job(GenerationParameters::new("forest")).await.unwrap();
        }

        tokio::time::sleep(Duration::from_secs(60 * 60)).await;

        let (status, body) = send(&router, get("/api/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_stream_until_terminal() {
        let (router, manager) = app(
            ScriptedProvider::new()
                .with_latency(Duration::from_secs(1))
                .then(Ok(StatusSnapshot::new("completed").with_artifact("https://x/y.mp4"))),
        );
        manager
            .start_job(GenerationParameters::new("forest"))
            .await
            .unwrap();

        let response = router.oneshot(get("/api/jobs/g1/events")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let states: Vec<&str> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .collect();

        assert_eq!(states.len(), 2);
        assert!(states[0].contains("\"Pending\""));
        assert!(states[1].contains("\"Completed\""));
        assert!(states[1].contains("https://x/y.mp4"));
    }
}
