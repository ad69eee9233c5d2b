use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use coachcard_common::{WorkoutDay, WorkoutPlan};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct GenerateQuery {
    #[serde(default)]
    batch: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/api/generate-image", post(generate_image))
        .route("/api/plan/pdf", post(plan_pdf))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "service": "coachcard-server",
        "version": env!("CARGO_PKG_VERSION"),
        "renderer": state.capturer_name(),
        "uptime_secs": state.uptime_secs(),
        "images_generated": state.images_generated(),
        "documents_generated": state.documents_generated(),
    }))
}

/// A week number counts as present only when it is a positive integer
fn week_number(payload: &Value) -> Option<u32> {
    payload
        .get("weekNumber")
        .and_then(Value::as_u64)
        .filter(|week| *week > 0)
        .and_then(|week| u32::try_from(week).ok())
}

fn present<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| !value.is_null())
}

async fn generate_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenerateQuery>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };

    if query.batch {
        generate_batch(&state, &payload).await
    } else {
        generate_single(&state, &payload).await
    }
}

async fn generate_single(state: &AppState, payload: &Value) -> Response {
    let (Some(day), Some(week_number)) = (present(payload, "day"), week_number(payload)) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields: day, weekNumber");
    };

    let day: WorkoutDay = match serde_json::from_value(day.clone()) {
        Ok(day) => day,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid day: {}", e)),
    };

    let mut orchestrator = state.orchestrator();
    match orchestrator.generate_one(&day, week_number).await {
        Ok(captured) => {
            state.record_images(1);
            Json(json!({ "image": captured.data_url() })).into_response()
        }
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.to_string())
        }
    }
}

/// Days are captured one after another; a failed day is reported in place
/// and does not stop the rest
async fn generate_batch(state: &AppState, payload: &Value) -> Response {
    let (Some(days), Some(week_number)) = (present(payload, "days"), week_number(payload)) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields: days, weekNumber");
    };

    let days: Vec<WorkoutDay> = match serde_json::from_value(days.clone()) {
        Ok(days) => days,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid days: {}", e)),
    };

    let mut orchestrator = state.orchestrator();
    let mut images = Vec::with_capacity(days.len());
    for day in &days {
        match orchestrator.generate_one(day, week_number).await {
            Ok(captured) => images.push(json!({
                "success": true,
                "dayNumber": captured.day_number,
                "dayLabel": captured.day_label,
                "muscleGroup": captured.muscle_group,
                "image": captured.data_url(),
            })),
            Err(e) => images.push(json!({
                "success": false,
                "dayNumber": day.day_number,
                "error": e.to_string(),
            })),
        }
    }

    state.record_images(orchestrator.gallery().len() as u64);
    info!(
        "Batch for week {}: {}/{} days captured",
        week_number,
        orchestrator.gallery().len(),
        days.len()
    );
    Json(json!({ "images": images })).into_response()
}

async fn plan_pdf(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let plan: WorkoutPlan = match serde_json::from_slice(&body) {
        Ok(plan) => plan,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid plan: {}", e)),
    };
    if let Err(e) = plan.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let mut orchestrator = state.orchestrator();
    let images = match orchestrator.generate_all(&plan).await {
        Ok(images) => images,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };
    state.record_images(images.len() as u64);

    let document = match state.assembler().with_title(plan.title.clone()).assemble(images).await {
        Ok(document) => document,
        Err(e) => {
            warn!("Document assembly failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    state.record_document();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        document.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use coachcard_common::factory::{create_workout_day, create_workout_plan};
    use coachcard_core::capture::{CaptureOptions, Capturer, RasterImage, RemoteApiCapturer};
    use coachcard_core::clock::TokioClock;
    use coachcard_core::config::{CoreConfig, RemoteConfig};
    use coachcard_core::template::VisualNode;
    use coachcard_core::{CaptureError, StagingArea};
    use std::time::Duration;
    use tower::ServiceExt;

    const ONE_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    struct StubCapturer {
        failing_day: Option<u32>,
    }

    #[async_trait]
    impl Capturer for StubCapturer {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn rasterize(
            &self,
            node: &VisualNode,
            _options: &CaptureOptions,
        ) -> Result<RasterImage, CaptureError> {
            if self.failing_day == Some(node.day_number) {
                return Err(CaptureError::raster("Canvas tainted"));
            }
            Ok(RasterImage::Png(STANDARD.decode(ONE_PIXEL_PNG).unwrap()))
        }
    }

    fn app_with(capturer: Arc<dyn Capturer>) -> (Router, Arc<AppState>) {
        let staging = Arc::new(StagingArea::new(Arc::new(TokioClock), Duration::ZERO));
        let state = Arc::new(AppState::new(CoreConfig::default(), capturer, staging));
        (router(state.clone()), state)
    }

    fn app(failing_day: Option<u32>) -> (Router, Arc<AppState>) {
        app_with(Arc::new(StubCapturer { failing_day }))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(None);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let (app, _) = app(None);
        let day = serde_json::to_value(create_workout_day(1)).unwrap();

        let response = app
            .oneshot(post_json("/api/generate-image", json!({ "day": day })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Missing required fields: day, weekNumber" })
        );
    }

    #[tokio::test]
    async fn test_generate_single_image() {
        let (app, state) = app(None);
        let day = serde_json::to_value(create_workout_day(1)).unwrap();

        let response = app
            .oneshot(post_json("/api/generate-image", json!({ "day": day, "weekNumber": 1 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(state.images_generated(), 1);
    }

    #[tokio::test]
    async fn test_generate_batch_reports_each_day() {
        let (app, _) = app(Some(2));
        let days: Vec<WorkoutDay> = (1..=3).map(create_workout_day).collect();

        let response = app
            .oneshot(post_json(
                "/api/generate-image?batch=true",
                json!({ "days": days, "weekNumber": 2 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let images = body["images"].as_array().unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0]["success"], true);
        assert_eq!(images[0]["dayLabel"], "Dia 1");
        assert_eq!(images[1], json!({ "success": false, "dayNumber": 2, "error": "Canvas tainted" }));
        assert_eq!(images[2]["dayNumber"], 3);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_bad_request() {
        let remote = RemoteApiCapturer::new(&RemoteConfig::default()).unwrap();
        let (app, _) = app_with(Arc::new(remote));
        let day = serde_json::to_value(create_workout_day(1)).unwrap();

        let response = app
            .oneshot(post_json("/api/generate-image", json!({ "day": day, "weekNumber": 1 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing rendering API credentials. Configure them in settings."
        );
    }

    #[tokio::test]
    async fn test_plan_pdf() {
        let (app, state) = app(None);
        let plan = serde_json::to_value(create_workout_plan(1, 2)).unwrap();

        let response = app.oneshot(post_json("/api/plan/pdf", plan)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"plan-de-entrenamiento.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(state.images_generated(), 2);
        assert_eq!(state.documents_generated(), 1);
    }

    #[tokio::test]
    async fn test_plan_pdf_aborts_on_failed_day() {
        let (app, state) = app(Some(2));
        let plan = serde_json::to_value(create_workout_plan(1, 3)).unwrap();

        let response = app.oneshot(post_json("/api/plan/pdf", plan)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Canvas tainted"));
        assert_eq!(state.documents_generated(), 0);
    }
}
