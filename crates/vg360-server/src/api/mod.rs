mod admin;
mod evaluations;
mod leader;
mod negotiators;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use vg360_core::{ScoringSettings, Viewer};
use vg360_db::DbError;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, resolve_viewer, AuthState,
    RateLimitState, RequestId, USER_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub scoring: ScoringSettings,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

#[derive(Debug, Serialize)]
struct ProfileData {
    #[serde(flatten)]
    viewer: Viewer,
    default_view: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Why a handler produced no data.
#[derive(Debug)]
pub enum Rejection {
    Api(ApiError),
    /// The view belongs to the other role; send the caller to their own.
    WrongRole(&'static str),
}

impl From<ApiError> for Rejection {
    fn from(error: ApiError) -> Self {
        Rejection::Api(error)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Api(error) => error.into_response(),
            Rejection::WrongRole(to) => Redirect::to(to).into_response(),
        }
    }
}

/// The leader's user id, or a redirect for administrators.
pub(super) fn require_leader(viewer: &Viewer) -> Result<i64, Rejection> {
    match viewer {
        Viewer::Leader { user_id, .. } => Ok(*user_id),
        Viewer::Administrator { .. } => Err(Rejection::WrongRole(viewer.default_view())),
    }
}

/// Pass administrators through, redirect leaders.
pub(super) fn require_admin(viewer: &Viewer) -> Result<(), Rejection> {
    match viewer {
        Viewer::Administrator { .. } => Ok(()),
        Viewer::Leader { .. } => Err(Rejection::WrongRole(viewer.default_view())),
    }
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::EvaluationCooldown { .. } => {
            tracing::warn!(error = %error, "evaluation rejected by cooldown");
            ApiError::new(request_id, "conflict", error.to_string())
        }
        DbError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(USER_HEADER),
        ])
}

fn protected_router(
    pool: PgPool,
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router<AppState> {
    Router::new()
        .route("/api/v1/profile", get(profile))
        .route("/api/v1/leader/dashboard", get(leader::dashboard))
        .route("/api/v1/leader/pending", get(leader::pending))
        .route(
            "/api/v1/negotiators/{cedula}",
            get(negotiators::get_negotiator),
        )
        .route(
            "/api/v1/negotiators/{cedula}/hacer-score",
            get(negotiators::hacer_score),
        )
        .route(
            "/api/v1/negotiators/{cedula}/indicators",
            get(negotiators::indicator_history),
        )
        .route(
            "/api/v1/negotiators/{cedula}/evaluations",
            post(evaluations::create_evaluation),
        )
        .route(
            "/api/v1/negotiators/{cedula}/evaluations/last",
            get(negotiators::last_evaluation),
        )
        .route(
            "/api/v1/negotiators/{cedula}/ser-evaluations",
            post(evaluations::create_ser_evaluation),
        )
        .route(
            "/api/v1/negotiators/{cedula}/report",
            get(negotiators::evaluation_report),
        )
        .route("/api/v1/admin/leaders", get(admin::list_leaders))
        .route(
            "/api/v1/admin/leaders/export",
            get(admin::export_leaders),
        )
        .route(
            "/api/v1/admin/leaders/{cedula}/negotiators",
            get(admin::leader_negotiators),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(pool, resolve_viewer)),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(state.pool.clone(), auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match vg360_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

async fn profile(
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
) -> Json<ApiResponse<ProfileData>> {
    let default_view = viewer.default_view();
    Json(ApiResponse::new(
        ProfileData {
            viewer,
            default_view,
        },
        req_id.0,
    ))
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
