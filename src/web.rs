//! Axum-based HTTP server with OpenAPI (utoipa) and Swagger UI

use crate::config::Config;
use crate::coordinator::PollCoordinator;
use crate::entities::{EntityRegistry, EntityView};
use crate::error::{Result, WanasError};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<PollCoordinator>,
    pub entities: Arc<EntityRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(coordinator: Arc<PollCoordinator>, config: Config) -> Self {
        let entities = Arc::new(EntityRegistry::build(&coordinator));
        Self {
            coordinator,
            entities,
            config: Arc::new(config),
        }
    }
}

fn error_body(status: StatusCode, err: &WanasError) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

#[utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
))]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[utoipa::path(get, path = "/api/status", responses(
    (status = 200, description = "Poller status")
))]
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let coordinator = &state.coordinator;
    let poll = coordinator.state();
    let plan: Vec<_> = coordinator
        .plan()
        .iter()
        .map(|b| serde_json::json!({"start": b.start, "count": b.count}))
        .collect();

    Json(serde_json::json!({
        "version": env!("APP_VERSION"),
        "device": crate::catalog::DEVICE_NAME,
        "manufacturer": crate::catalog::MANUFACTURER,
        "device_id": coordinator.device_id(),
        "protocol": state.config.connection.protocol.to_string(),
        "scan_interval_secs": coordinator.scan_interval().as_secs(),
        "connected": coordinator.connection_status(),
        "last_update_success": poll.last_update_success,
        "last_error": poll.last_error,
        "last_success_at": poll.last_success_at,
        "last_attempt_at": poll.last_attempt_at,
        "total_polls": poll.total_polls,
        "failed_polls": poll.failed_polls,
        "last_poll_duration_ms": poll.last_poll_duration_ms,
        "read_blocks": plan,
    }))
}

#[utoipa::path(get, path = "/api/snapshot", responses(
    (status = 200, description = "Raw register words by address"),
    (status = 503, description = "No successful poll yet")
))]
async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.data() {
        Some(data) => (
            StatusCode::OK,
            Json(serde_json::to_value(&*data).unwrap_or(serde_json::json!({}))),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "no data yet"})),
        ),
    }
}

#[utoipa::path(get, path = "/api/sensors", responses((status = 200)))]
async fn sensors(State(state): State<AppState>) -> impl IntoResponse {
    let reports: Vec<_> = state.entities.sensors().iter().map(|s| s.report()).collect();
    Json(reports)
}

#[utoipa::path(get, path = "/api/switches", responses((status = 200)))]
async fn switches(State(state): State<AppState>) -> impl IntoResponse {
    let reports: Vec<_> = state.entities.switches().iter().map(|s| s.report()).collect();
    Json(reports)
}

async fn command_switch(state: AppState, key: String, on: bool) -> impl IntoResponse {
    let Some(switch) = state.entities.switch(&key) else {
        return error_body(StatusCode::NOT_FOUND, &WanasError::unknown_entity(key));
    };
    let result = if on {
        switch.turn_on().await
    } else {
        switch.turn_off().await
    };
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::to_value(switch.report()).unwrap_or(serde_json::json!({"ok":true}))),
        ),
        Err(e) => error_body(StatusCode::BAD_GATEWAY, &e),
    }
}

#[utoipa::path(post, path = "/api/switches/{key}/turn_on",
    params(("key" = String, Path, description = "Switch key")),
    responses(
        (status = 200, description = "Written and refreshed"),
        (status = 404, description = "Unknown switch"),
        (status = 502, description = "Device rejected or did not answer the write")
    ))]
async fn turn_on(State(state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    command_switch(state, key, true).await
}

#[utoipa::path(post, path = "/api/switches/{key}/turn_off",
    params(("key" = String, Path, description = "Switch key")),
    responses(
        (status = 200, description = "Written and refreshed"),
        (status = 404, description = "Unknown switch"),
        (status = 502, description = "Device rejected or did not answer the write")
    ))]
async fn turn_off(State(state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    command_switch(state, key, false).await
}

#[utoipa::path(post, path = "/api/refresh", responses(
    (status = 200, description = "Poll cycle succeeded"),
    (status = 502, description = "Poll cycle failed")
))]
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.refresh().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"ok":true}))),
        Err(e) => error_body(StatusCode::BAD_GATEWAY, &e),
    }
}

#[utoipa::path(get, path = "/api/config", responses((status = 200)))]
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(&*state.config)
        .unwrap_or(serde_json::json!({"error":"serialization"}));
    Json(json)
}

#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[utoipa::path(get, path = "/api/events", responses((status = 200)))]
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.coordinator.subscribe();
    let stream = WatchStream::new(rx).filter_map(|poll| {
        Event::default()
            .event("state")
            .json_data(&*poll)
            .ok()
            .map(Ok::<Event, std::convert::Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health, status, snapshot, sensors, switches, turn_on, turn_off,
        refresh, get_config, get_config_schema, events,
    ),
    tags((name = "wanas", description = "Wanas heat recovery unit API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/snapshot", get(snapshot))
        .route("/api/sensors", get(sensors))
        .route("/api/switches", get(switches))
        .route("/api/switches/{key}/turn_on", post(turn_on))
        .route("/api/switches/{key}/turn_off", post(turn_off))
        .route("/api/refresh", post(refresh))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .route("/api/events", get(events))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WanasError::web(format!("cannot bind {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| WanasError::web(e.to_string()))?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api, docs /docs)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| WanasError::web(e.to_string()))
}
