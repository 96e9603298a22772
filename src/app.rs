use crate::config::ProxyConfig;
use crate::tmdb::{ProxyParams, TmdbApi, TmdbClient, UpstreamRequest};
use anyhow::Result;
use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

pub const MISSING_KEY_MESSAGE: &str = "TMDB API key not configured";
const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Clone)]
pub struct AppState {
    /// Upstream client; `None` when the server holds no TMDB credential.
    pub tmdb: Option<Arc<dyn TmdbApi>>,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        let tmdb = TmdbClient::from_config(config)?.map(|c| Arc::new(c) as Arc<dyn TmdbApi>);
        Ok(Self { tmdb })
    }
}

pub async fn run_server(config: ProxyConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;
    if state.tmdb.is_none() {
        warn!("TMDB_API_KEY is not set; proxy requests will fail with 500");
    } else {
        info!("Forwarding to TMDB at {}", config.tmdb_base_url);
    }

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(handle_proxy))
        .route("/tmdb-proxy", any(handle_proxy))
        .route("/health", get(health))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Answers preflight requests directly and stamps the cross-origin headers on
/// every other response.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

async fn handle_proxy(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let Some(tmdb) = state.tmdb.as_ref() else {
        error!("Rejecting request: {}", MISSING_KEY_MESSAGE);
        return error_response(MISSING_KEY_MESSAGE);
    };

    let params = ProxyParams::from_pairs(&pairs);
    let request = UpstreamRequest::from_params(&params);
    debug!(?params, ?request, "Mapped proxy request");

    match tmdb.fetch(&request).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!("Upstream call failed for {:?}: {:#}", request, e);
            error_response(&format!("{:#}", e))
        }
    }
}

fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
