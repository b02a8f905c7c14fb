use std::time::Duration;

use axum::{
    BoxError, Json,
    error_handling::HandleErrorLayer,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use saferoute_core::{Error, Route, RouteQuery, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

#[derive(Debug, Deserialize)]
pub struct RouteParams {
    source: Option<String>,
    destination: Option<String>,
    time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    /// `[lat, lon]` pairs from source to destination
    route: Vec<(f64, f64)>,
    nodes: Vec<u64>,
    time_bin: String,
    total_risk: f64,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        Self {
            route: route.coordinates,
            nodes: route.nodes,
            time_bin: route.time_bin,
            total_risk: route.total_risk,
        }
    }
}

/// Domain error rendered as `{"error": message}` with a matching status
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MissingInput(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::BinNotFound(_) | Error::OutOfCoverageSnap { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::NoPathFound => StatusCode::NOT_FOUND,
        Error::SearchTimeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Malformed query string: {rejection}");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            error!("Route request failed: {error}");
        } else {
            debug!("Route request rejected: {error}");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn find_safe_route(
    State(router): State<Router>,
    params: Result<Query<RouteParams>, QueryRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Query(params) = params?;
    let query = RouteQuery::parse(
        params.source.as_deref(),
        params.destination.as_deref(),
        params.time.as_deref(),
    )?;

    let route = tokio::task::spawn_blocking(move || router.find_safest_route(&query))
        .await
        .map_err(|e| ApiError::internal(format!("Route worker failed: {e}")))??;

    Ok(Json(route.into()))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request exceeded its deadline");
        ApiError {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: "Request timed out".to_string(),
        }
    } else {
        ApiError::internal(format!("Unhandled internal error: {err}"))
    }
}

pub fn app(router: Router, request_timeout: Duration, concurrency_limit: usize) -> axum::Router {
    axum::Router::new()
        .route("/find_safe_route", get(find_safe_route))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout)
                .concurrency_limit(concurrency_limit),
        )
        .with_state(router)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use saferoute_core::RouterConfig;
    use saferoute_core::loading::road_graph_from_document;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    // 0 - 1 - 2 is cheap in the morning, the direct 0 - 2 edge at night.
    // Node 3 is isolated from the rest.
    fn test_router(config: RouterConfig) -> Router {
        let nodes = json!([
            {"id": 1, "y": 34.00, "x": -118.0},
            {"id": 2, "y": 34.01, "x": -118.0},
            {"id": 3, "y": 34.02, "x": -118.0},
            {"id": 4, "y": 34.00, "x": -117.9},
            {"id": 5, "y": 34.01, "x": -117.9},
        ]);
        let mut edges = Vec::new();
        for (u, v, morning, night) in [(1, 2, 1, 5), (2, 3, 1, 5), (1, 3, 4, 1), (4, 5, 0, 0)] {
            for (from, to) in [(u, v), (v, u)] {
                edges.push(json!({
                    "u": from, "v": to,
                    "risk_06:00:00": morning.to_string(),
                    "risk_18:00:00": night.to_string(),
                }));
            }
        }
        let document =
            serde_json::from_value(json!({"nodes": nodes, "edges": edges})).unwrap();
        let graph = road_graph_from_document(document).unwrap();
        Router::new(Arc::new(graph), config)
    }

    fn test_app(config: RouterConfig) -> axum::Router {
        app(test_router(config), Duration::from_secs(5), 8)
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(test_app(RouterConfig::default()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn morning_route_follows_safer_chain() {
        let (status, body) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=34.0001,-118.0&destination=34.0199,-118.0&time=07:15:00",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"], json!([1, 2, 3]));
        assert_eq!(body["time_bin"], "06:00:00");
        assert_eq!(body["total_risk"], 2.0);
        assert_eq!(body["route"][0], json!([34.0, -118.0]));
        assert_eq!(body["route"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn night_route_takes_direct_edge() {
        let (status, body) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=34.0,-118.0&destination=34.02,-118.0&time=22:00:00",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"], json!([1, 3]));
        assert_eq!(body["time_bin"], "18:00:00");
    }

    #[tokio::test]
    async fn missing_time_is_bad_request() {
        let (status, body) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=34.0,-118.0&destination=34.02,-118.0",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing input: time");
    }

    #[tokio::test]
    async fn malformed_coordinate_is_bad_request() {
        let (status, body) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=somewhere&destination=34.02,-118.0&time=08:00:00",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn rejected_query_string_keeps_json_error_shape() {
        let (status, body) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=34.0,-118.0&source=34.1,-118.0&destination=34.02,-118.0&time=08:00:00",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("source"));
    }

    #[tokio::test]
    async fn disconnected_endpoints_are_not_found() {
        let (status, _) = get_json(
            test_app(RouterConfig::default()),
            "/find_safe_route?source=34.0,-118.0&destination=34.0,-117.9&time=08:00:00",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn far_endpoint_is_unprocessable_with_snap_cap() {
        let config = RouterConfig {
            max_snap_distance_m: Some(1000.0),
            ..RouterConfig::default()
        };
        let (status, _) = get_json(
            test_app(config),
            "/find_safe_route?source=34.0,-118.0&destination=40.7,-74.0&time=08:00:00",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(status_for(&Error::SearchTimeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&Error::BinNotFound("03".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&Error::InvalidNodeIndex),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
