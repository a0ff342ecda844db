//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the API, provider and fallback routes
//! - Wire up middleware (request ID, tracing, CORS, auth, deadlines, panics)
//! - Serve on a listener until shutdown

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::{header::InvalidHeaderName, HeaderName, HeaderValue, Method, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use tokio::net::TcpListener;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer},
    trace::TraceLayer,
};

use crate::api::{self, handlers, require_key, ApiError, KeyGate};
use crate::config::{CorsConfig, ManagerConfig};
use crate::lifecycle::Shutdown;
use crate::provider::provider_config;
use crate::store::ResourceStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResourceStore>,
    pub started: Instant,
}

impl AppState {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self {
            store,
            started: Instant::now(),
        }
    }
}

/// HTTP server for the management API and the provider endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Fails only if a configured gate header name is not a valid header.
    pub fn new(config: &ManagerConfig, store: Arc<ResourceStore>) -> Result<Self, InvalidHeaderName> {
        let router = Self::build_router(config, AppState::new(store))?;
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap the ones added before them.
    fn build_router(config: &ManagerConfig, state: AppState) -> Result<Router, InvalidHeaderName> {
        let prefix = config.server.api_prefix();
        let provider_path = config.provider.path.as_str();

        let app = if prefix.is_empty() {
            Router::new().merge(api::routes())
        } else {
            Router::new().nest(prefix, api::routes())
        };

        let mut provider = Router::new().route(provider_path, get(provider_config));
        if config.provider.auth.enabled {
            let gate = KeyGate::new(&config.provider.auth.header_name, &config.provider.auth.key)?;
            provider = provider.route_layer(middleware::from_fn_with_state(gate, require_key));
        }

        let mut app = app.merge(provider).fallback(handlers::not_found);

        if config.auth.enabled {
            // The provider endpoint answers only to its own gate.
            let gate = KeyGate::new(&config.auth.header_name, &config.auth.key)?
                .excluding(vec![format!("{prefix}/health"), provider_path.to_string()]);
            app = app.layer(middleware::from_fn_with_state(gate, require_key));
        }

        let server = &config.server;
        let app = app
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_deadline))
                    .layer(TimeoutLayer::new(server.request_timeout)),
            )
            .layer(RequestBodyTimeoutLayer::new(server.read_timeout))
            .layer(ResponseBodyTimeoutLayer::new(server.write_timeout))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors_layer(&config.cors))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(state);

        Ok(app)
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn handle_deadline(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("Unhandled internal error: {err}"))
    }
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::Internal("Internal server error".to_string()).into_response()
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.allows_any_origin() {
        // A literal `*` cannot be combined with credentials.
        if cors.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cors.allow_credentials)
        .max_age(cors.max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use tower::ServiceExt;

    fn server(config: &ManagerConfig) -> Router {
        HttpServer::new(config, Arc::new(ResourceStore::new()))
            .unwrap()
            .router()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404_with_request_id() {
        let response = server(&ManagerConfig::default())
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_propagated() {
        let response = server(&ManagerConfig::default())
            .oneshot(
                Request::get("/api/v1/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_gate_excludes_health_and_provider() {
        let mut config = ManagerConfig::default();
        config.auth.enabled = true;
        config.auth.key = "api".into();
        let app = server(&config);

        for path in ["/api/v1/health", "/traefik/provider"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/routers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::get("/api/v1/routers")
                    .header("X-API-Key", "api")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_base_path_mounts_api_at_root() {
        let mut config = ManagerConfig::default();
        config.server.base_path = "/".into();
        let response = server(&config)
            .oneshot(Request::get("/services").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = server(&ManagerConfig::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/routers")
                    .header("origin", "https://ui.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-max-age"], "300");
    }

    #[tokio::test]
    async fn test_credentials_with_wildcard_mirror_origin() {
        let mut config = ManagerConfig::default();
        config.cors.allow_credentials = true;
        let response = server(&config)
            .oneshot(
                Request::get("/api/v1/health")
                    .header("origin", "https://ui.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://ui.example"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }
}
