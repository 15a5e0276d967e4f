use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{panic_responder, route_not_found};
use axum::Router;
use axum::http::{HeaderValue, Method, Uri, header};
use core_config::Environment;
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Path of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Combine API routes with documentation and cross-cutting layers.
///
/// This function sets up:
/// - OpenAPI document at [`OPENAPI_JSON_PATH`] with Swagger UI at `/swagger-ui`
/// - API routes merged at the root
/// - 404 fallback listing `endpoints`
/// - Request tracing, JSON panic recovery, optional CORS, compression
///
/// Panic details are only returned to clients outside production.
///
/// CORS is enabled only when `server_config.cors_allowed_origins` holds a
/// comma-separated origin list.
///
/// # Errors
/// Returns `InvalidInput` if an origin is not a valid header value or the
/// list contains no origin.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use utoipa::OpenApi;
/// use axum_helpers::server::create_router;
///
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new()
///     .route("/example", get(handler))
///     .with_state(my_state);
///
/// let router = create_router::<ApiDoc>(api_routes, &config, &env, &["GET /example"])?;
/// ```
pub fn create_router<T>(
    apis: Router,
    server_config: &ServerConfig,
    environment: &Environment,
    endpoints: &'static [&'static str],
) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, T::openapi()))
        .merge(apis)
        .fallback(move |method: Method, uri: Uri| async move {
            route_not_found(&method, &uri, endpoints)
        })
        .layer(CatchPanicLayer::custom(panic_responder(
            !environment.is_production(),
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if let Some(origins) = server_config.cors_allowed_origins.as_deref() {
        router = router.layer(cors_layer(origins)?);
    }

    // gzip, br, deflate, zstd based on Accept-Encoding
    Ok(router.layer(CompressionLayer::new()))
}

/// CORS layer for a comma-separated origin list.
pub fn cors_layer(origins: &str) -> io::Result<CorsLayer> {
    let allowed_origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    if allowed_origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CORS_ALLOWED_ORIGIN cannot be empty",
        ));
    }

    info!("CORS configured with allowed origins: {}", origins);

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600)))
}

/// Production-ready server with coordinated shutdown and cleanup.
///
/// This provides:
/// - Graceful shutdown on SIGINT/SIGTERM, draining in-flight requests
/// - A cleanup future run after the signal, bounded by `shutdown_timeout`
///
/// # Example
/// ```ignore
/// use std::time::Duration;
/// use axum_helpers::server::create_production_app;
///
/// let cleanup = async move {
///     client.shutdown().await;
/// };
///
/// create_production_app(router, &config, Duration::from_secs(30), cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, _rx) = ShutdownCoordinator::new();
    let shutdown_handle = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        shutdown_handle.wait_for_signal().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { coordinator.wait_for_signal().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    cleanup_handle.await.ok();

    serve_result
}
