//! Drives one grant through every pipeline stage.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::fetcher::ResourceFetcher;
use crate::metadata::{MetadataBuilder, MetadataTemplate};
use crate::pipeline::state::{PipelineState, RunTracker, Stage};
use crate::plan::ProofPlan;
use crate::traits::{
    ArtifactPublisher, ProofEngine, ProofVerifier, ResourceApi, TokenExchanger, TokenRefresher,
    TokenStore,
};
use crate::types::{
    AuthorizationGrant, NftMetadata, PublishedArtifact, ResourceSnapshot, TokenSet, VerifiedClaim,
};

/// Message returned when the proof engine produces no proof.
pub const PROOF_GENERATION_MESSAGE: &str = "Failed to generate proof.";

/// Message returned when a proof fails signature verification.
pub const PROOF_INVALID_MESSAGE: &str = "Proof is invalid.";

/// Message returned when the proven channel is not the one that was fetched.
pub const CLAIM_MISMATCH_MESSAGE: &str = "Proof was issued for a different channel.";

/// Upper bounds for each external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub token_exchange: Duration,
    pub resource_fetch: Duration,
    pub proof_generation: Duration,
    pub proof_verification: Duration,
    pub publish: Duration,
}

impl StageTimeouts {
    fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::TokenExchange => self.token_exchange,
            Stage::ResourceFetch => self.resource_fetch,
            Stage::ProofGeneration => self.proof_generation,
            Stage::ProofVerification => self.proof_verification,
            Stage::Publish => self.publish,
            Stage::MetadataBuild => Duration::MAX,
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            token_exchange: Duration::from_secs(10),
            resource_fetch: Duration::from_secs(15),
            proof_generation: Duration::from_secs(120),
            proof_verification: Duration::from_secs(30),
            publish: Duration::from_secs(60),
        }
    }
}

/// Input for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Raw authorization code from the callback.
    pub code: String,

    /// Token-store key for this session. Falls back to a grant-derived key.
    pub session_key: Option<String>,
}

impl RunRequest {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            session_key: None,
        }
    }

    #[must_use]
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub snapshot: ResourceSnapshot,
    pub claim: VerifiedClaim,
    pub metadata: NftMetadata,
    pub artifact: PublishedArtifact,
}

impl PipelineOutcome {
    /// Channel id as proven by the claim.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        self.claim.field("channelId").unwrap_or(&self.snapshot.id)
    }
}

/// A run that stopped at `stage`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub run_id: Uuid,
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

/// The external systems a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub exchanger: Arc<dyn TokenExchanger>,
    pub refresher: Arc<dyn TokenRefresher>,
    pub resource_api: Arc<dyn ResourceApi>,
    pub proof_engine: Arc<dyn ProofEngine>,
    pub verifier: Arc<dyn ProofVerifier>,
    pub publisher: Arc<dyn ArtifactPublisher>,
    pub token_store: Arc<dyn TokenStore>,
}

/// Sequences the pipeline stages for each grant.
///
/// Runs share no mutable state beyond the keyed token store, so one
/// orchestrator can serve concurrent callbacks.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    exchanger: Arc<dyn TokenExchanger>,
    fetcher: ResourceFetcher,
    proof_engine: Arc<dyn ProofEngine>,
    verifier: Arc<dyn ProofVerifier>,
    publisher: Arc<dyn ArtifactPublisher>,
    token_store: Arc<dyn TokenStore>,
    plan: ProofPlan,
    builder: MetadataBuilder,
    timeouts: StageTimeouts,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns a `Schema` error if the template reads claim fields the plan
    /// does not extract.
    pub fn new(
        collaborators: Collaborators,
        plan: ProofPlan,
        template: MetadataTemplate,
    ) -> Result<Self, PipelineError> {
        plan.ensure_covers(&template)?;

        let Collaborators {
            exchanger,
            refresher,
            resource_api,
            proof_engine,
            verifier,
            publisher,
            token_store,
        } = collaborators;

        Ok(Self {
            exchanger,
            fetcher: ResourceFetcher::new(resource_api, refresher),
            proof_engine,
            verifier,
            publisher,
            token_store,
            plan,
            builder: MetadataBuilder::new(template),
            timeouts: StageTimeouts::default(),
        })
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn timeouts(&self) -> &StageTimeouts {
        &self.timeouts
    }

    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Runs the pipeline for one grant.
    ///
    /// # Errors
    ///
    /// Returns the failing stage together with the error it produced. The
    /// error kind is whatever the stage returned; nothing is reclassified.
    pub async fn run(&self, request: RunRequest) -> Result<PipelineOutcome, PipelineFailure> {
        let mut tracker = RunTracker::new();
        let span = tracing::info_span!("pipeline.run", run_id = %tracker.run_id());

        async move {
            match self.execute(&mut tracker, request).await {
                Ok(outcome) => {
                    tracing::info!(
                        channel_id = %outcome.channel_id(),
                        uri = %outcome.artifact.uri,
                        elapsed_ms = tracker.elapsed_ms(),
                        "pipeline completed"
                    );
                    Ok(outcome)
                }
                Err(error) => {
                    let stage = tracker.fail(error.clone());
                    tracing::warn!(
                        %stage,
                        kind = %error.kind(),
                        error = %error,
                        path = ?tracker.history(),
                        elapsed_ms = tracker.elapsed_ms(),
                        "pipeline failed"
                    );
                    Err(PipelineFailure {
                        run_id: tracker.run_id(),
                        stage,
                        error,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        tracker: &mut RunTracker,
        request: RunRequest,
    ) -> Result<PipelineOutcome, PipelineError> {
        let RunRequest { code, session_key } = request;

        let grant = AuthorizationGrant::parse(code)?;
        let session_key = session_key.unwrap_or_else(|| grant.fingerprint());

        let mut tokens = self
            .timed(Stage::TokenExchange, self.exchanger.exchange(grant))
            .await?;
        self.token_store.put(&session_key, tokens.clone()).await;
        tracker.advance(PipelineState::Exchanged)?;

        let snapshot = self
            .timed(Stage::ResourceFetch, self.fetcher.fetch(&mut tokens))
            .await?;
        self.remember_tokens(&session_key, &snapshot, &mut tokens).await;
        tracker.advance(PipelineState::Fetched)?;
        tracing::debug!(channel_id = %snapshot.id, "resource fetched");

        let spec = self.plan.request_for(&snapshot, &tokens);
        let proof = self
            .timed(Stage::ProofGeneration, self.proof_engine.generate_proof(&spec))
            .await?
            .ok_or_else(|| PipelineError::proof_generation(PROOF_GENERATION_MESSAGE))?;
        tracker.advance(PipelineState::ProofGenerated)?;

        let valid = self
            .timed(Stage::ProofVerification, self.verifier.verify(&proof))
            .await?;
        if !valid {
            return Err(PipelineError::proof_verification(PROOF_INVALID_MESSAGE));
        }
        let claim = self.verifier.transform(&proof)?;
        spec.validate_claim(&claim)?;
        if claim.field("channelId").is_some_and(|id| id != snapshot.id) {
            return Err(PipelineError::proof_verification(CLAIM_MISMATCH_MESSAGE));
        }
        tracker.advance(PipelineState::Verified)?;

        let metadata = self.builder.build(&claim, &snapshot)?;
        let bytes = metadata.to_bytes()?;
        tracker.advance(PipelineState::MetadataBuilt)?;

        let uri = self
            .timed(Stage::Publish, self.publisher.publish(&bytes))
            .await?;
        tracker.advance(PipelineState::Published)?;
        tracker.advance(PipelineState::Done)?;

        Ok(PipelineOutcome {
            run_id: tracker.run_id(),
            snapshot,
            claim,
            metadata,
            artifact: PublishedArtifact { uri, bytes },
        })
    }

    /// Stores the live tokens under the session and the channel identity.
    ///
    /// Google only returns a refresh token on first consent, so a refresh
    /// token already held for the channel is kept when the new set has none.
    async fn remember_tokens(
        &self,
        session_key: &str,
        snapshot: &ResourceSnapshot,
        tokens: &mut TokenSet,
    ) {
        let identity_key = format!("channel:{}", snapshot.id);
        if !tokens.can_refresh() {
            if let Some(previous) = self.token_store.get(&identity_key).await {
                if previous.can_refresh() {
                    tokens.refresh_token = previous.refresh_token;
                }
            }
        }
        self.token_store.put(session_key, tokens.clone()).await;
        self.token_store.put(&identity_key, tokens.clone()).await;
    }

    async fn timed<T, F>(&self, stage: Stage, call: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let limit = self.timeouts.for_stage(stage);
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(stage.timeout_error(format!(
                "{stage} timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }
}
