use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use proofmint_auth::{GoogleOAuthConfig, PendingConsents, spawn_purge_task};
use proofmint_core::{NftMetadata, PipelineOrchestrator};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{bootstrap, config::AppConfig, handlers};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// Consent `state` values issued by `/auth` and not yet redeemed
    pub consents: Arc<PendingConsents>,
    pub oauth: Arc<GoogleOAuthConfig>,
    /// Most recently built metadata document, served by `/getmetadata`
    pub last_metadata: Arc<ArcSwapOption<NftMetadata>>,
    pub snapshot_path: Option<PathBuf>,
}

pub struct ProofmintServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
    purge_interval: Duration,
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/auth", get(handlers::auth))
        .route("/oauth2callback", get(handlers::oauth2callback))
        .route("/getmetadata", get(handlers::get_metadata))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            // The query string carries the authorization code; log the path only.
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri().path(),
                                http.status_code = Empty,
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(cors_layer(&cfg.server.cors_origins)),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<ProofmintServer> {
        let state = bootstrap::build_state(&self.config)?;
        let app = build_app(&self.config, state.clone());

        Ok(ProofmintServer {
            addr: self.addr,
            app,
            state,
            purge_interval: self.config.token_store.purge_interval(),
        })
    }
}

impl ProofmintServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let token_purge = spawn_purge_task(
            self.state.orchestrator.token_store().clone(),
            self.purge_interval,
        );
        let consent_purge = spawn_consent_purge(self.state.consents.clone(), self.purge_interval);
        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        token_purge.abort();
        consent_purge.abort();
        served?;
        Ok(())
    }
}

fn spawn_consent_purge(
    consents: Arc<PendingConsents>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = consents.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Expired consent states purged");
            }
        }
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
