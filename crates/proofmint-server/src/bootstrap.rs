//! Wiring of configuration into pipeline collaborators.
//!
//! Every adapter is constructed once at startup and shared by all requests.
//! Construction failures (bad endpoint URL, unbuildable HTTP client, a
//! template the proof plan cannot back) are startup faults.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use proofmint_auth::{GoogleOAuthClient, GoogleOAuthConfig, MemoryTokenStore, PendingConsents, YoutubeChannelApi};
use proofmint_core::{ArtifactPublisher, Collaborators, PipelineOrchestrator, ProofPlan};
use proofmint_proof::{ProofServiceConfig, ReclaimProofEngine, ReclaimProofVerifier};
use proofmint_storage::{HttpPinningPublisher, MemoryPublisher, PinningServiceConfig};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::server::AppState;

/// Builds the shared application state from a validated configuration.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let timeouts = cfg.timeouts.stage_timeouts();

    let oauth = oauth_config(cfg).with_request_timeout(timeouts.token_exchange);
    let oauth_client =
        Arc::new(GoogleOAuthClient::new(oauth.clone()).context("failed to build OAuth client")?);

    let resource_api = Arc::new(
        YoutubeChannelApi::new(&cfg.google.youtube_api_base, timeouts.resource_fetch)
            .context("failed to build YouTube client")?,
    );

    let proof_service = ProofServiceConfig::new(
        &cfg.proof.endpoint,
        &cfg.proof.app_id,
        &cfg.proof.app_secret,
    );
    let proof_engine = Arc::new(
        ReclaimProofEngine::new(
            proof_service
                .clone()
                .with_request_timeout(timeouts.proof_generation),
        )
        .context("failed to build proof engine client")?,
    );
    let verifier = Arc::new(
        ReclaimProofVerifier::new(proof_service.with_request_timeout(timeouts.proof_verification))
            .context("failed to build proof verifier client")?,
    );

    let publisher = build_publisher(cfg, timeouts.publish)?;
    let token_store = Arc::new(MemoryTokenStore::new(cfg.token_store.ttl()));

    let plan = ProofPlan::youtube_channel(&cfg.google.youtube_api_base)
        .context("failed to compile proof plan")?;
    let template = cfg.metadata.template.template();

    let orchestrator = PipelineOrchestrator::new(
        Collaborators {
            exchanger: oauth_client.clone(),
            refresher: oauth_client,
            resource_api,
            proof_engine,
            verifier,
            publisher,
            token_store,
        },
        plan,
        template,
    )
    .context("metadata template does not match proof plan")?
    .with_timeouts(timeouts);

    info!(
        template = %cfg.metadata.template,
        storage = ?cfg.storage.backend,
        youtube_api_base = %cfg.google.youtube_api_base,
        "Pipeline initialized"
    );

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        consents: Arc::new(PendingConsents::new(Duration::from_secs(
            cfg.google.consent_ttl_secs,
        ))),
        oauth: Arc::new(oauth),
        last_metadata: Arc::new(ArcSwapOption::empty()),
        snapshot_path: cfg.metadata.snapshot_path.clone(),
    })
}

fn oauth_config(cfg: &AppConfig) -> GoogleOAuthConfig {
    GoogleOAuthConfig::new(
        &cfg.google.client_id,
        &cfg.google.client_secret,
        &cfg.google.redirect_uri,
    )
    .with_auth_endpoint(&cfg.google.auth_endpoint)
    .with_token_endpoint(&cfg.google.token_endpoint)
    .with_scope(&cfg.google.scope)
}

fn build_publisher(cfg: &AppConfig, timeout: Duration) -> anyhow::Result<Arc<dyn ArtifactPublisher>> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory metadata store");
            Ok(Arc::new(MemoryPublisher::new()))
        }
        StorageBackend::Http => {
            let mut pinning = PinningServiceConfig::new(&cfg.storage.upload_url, &cfg.storage.api_key)
                .with_request_timeout(timeout);
            if let Some(gateway) = &cfg.storage.gateway {
                pinning = pinning.with_gateway(gateway);
            }
            let publisher =
                HttpPinningPublisher::new(pinning).context("failed to build pinning client")?;
            Ok(Arc::new(publisher))
        }
    }
}
