//! # API REST
//!
//! REST boundary for the course widget service.
//!
//! Implements the endpoint:
//!     /institutions/{institution_id}/courses/{course_id}/modes/{mode}
//!
//! The handler is thin glue: validate the route parameters, resolve the
//! newest successfully published dataset version, look the course up and map
//! the outcome to a status code. All domain logic lives in `widget-core`.

#![warn(rust_2018_idioms)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use widget_core::{
    valid_course_params, CoreConfig, CourseQuery, CourseService, DataSetService, DocumentStore,
    LocalisedName, Widget, WidgetError, WidgetStatistics,
};

/// Application state shared across REST API handlers.
///
/// Holds the startup-resolved configuration and the long-lived read-only
/// store handle; both are shared by reference into the per-request services.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_course_widget),
    components(schemas(HealthRes, Widget, LocalisedName, WidgetStatistics))
)]
struct ApiDoc;

/// Builds the REST router with all routes, documentation and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/institutions/:institution_id/courses/:course_id/modes/:mode",
            get(get_course_widget),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Course widget API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/institutions/{institution_id}/courses/{course_id}/modes/{mode}",
    params(
        ("institution_id" = String, Path, description = "Published institution identifier (8 digits)"),
        ("course_id" = String, Path, description = "Course identifier"),
        ("mode" = String, Path, description = "Study mode: 1, 2 or 3")
    ),
    responses(
        (status = 200, description = "The course widget", body = Widget),
        (status = 400, description = "Invalid parameter"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Returns the public widget for one course.
///
/// A `version` query parameter is accepted for historical reasons but
/// ignored; the served dataset version is always the newest successfully
/// published one.
async fn get_course_widget(
    State(state): State<AppState>,
    AxumPath((institution_id, course_id, mode)): AxumPath<(String, String, String)>,
) -> Response {
    let query = CourseQuery {
        institution_id,
        course_id,
        mode,
    };

    // The params end up in store queries, so validate before building any.
    if !valid_course_params(&course_params(&query)) {
        tracing::error!(?query, "course parameters failed validation");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "Parameter Error",
            "Invalid parameter passed",
        );
    }

    let datasets = DataSetService::new(state.store.clone(), state.cfg.clone());
    let version = match datasets.highest_successful_version() {
        Ok(version) => version,
        Err(e) => return internal_error(&e),
    };

    let courses = CourseService::new(state.store.clone(), state.cfg.clone());
    match courses.get_course(version, &query) {
        Ok(Some(widget)) => (StatusCode::OK, Json(widget)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Not Found",
            "course",
            "Course was not found.",
        ),
        Err(e) => internal_error(&e),
    }
}

fn course_params(query: &CourseQuery) -> HashMap<String, String> {
    HashMap::from([
        ("institution_id".to_string(), query.institution_id.clone()),
        ("course_id".to_string(), query.course_id.clone()),
        ("mode".to_string(), query.mode.clone()),
    ])
}

/// Builds the JSON error envelope used by all non-200 responses.
pub fn http_error_body(error_title: &str, error_key: &str, error_value: &str) -> serde_json::Value {
    let mut error_values = serde_json::Map::new();
    error_values.insert(
        error_key.to_string(),
        serde_json::Value::String(error_value.to_string()),
    );

    serde_json::json!({
        "errors": [
            {"error": error_title, "error_values": [error_values]}
        ]
    })
}

fn error_response(
    status: StatusCode,
    error_title: &str,
    error_key: &str,
    error_value: &str,
) -> Response {
    (status, Json(http_error_body(error_title, error_key, error_value))).into_response()
}

fn internal_error(err: &WidgetError) -> Response {
    tracing::error!(error = ?err, "course lookup failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        "course",
        "Internal server error",
    )
}
