//! Pipeline run state machine.
//!
//! ```text
//! Start → Exchanged → Fetched → ProofGenerated → Verified → MetadataBuilt → Published → Done
//!   └──────────┴──────────┴─────────────┴─────────────┴────────────┴──────────→ Failed(stage, error)
//! ```
//!
//! Every state is reachable only from its predecessor. There is no backward
//! transition; `Failed` and `Done` are terminal.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;

/// A unit of work between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TokenExchange,
    ResourceFetch,
    ProofGeneration,
    ProofVerification,
    MetadataBuild,
    Publish,
}

impl Stage {
    /// Error produced when this stage's external call exceeds its timeout.
    ///
    /// A timeout is reported as the stage's own failure kind.
    #[must_use]
    pub fn timeout_error(self, message: impl Into<String>) -> PipelineError {
        match self {
            Self::TokenExchange => PipelineError::grant(message),
            Self::ResourceFetch => PipelineError::resource_fetch(message),
            Self::ProofGeneration => PipelineError::proof_generation(message),
            Self::ProofVerification => PipelineError::proof_verification(message),
            Self::MetadataBuild => PipelineError::schema(message),
            Self::Publish => PipelineError::publish(message),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TokenExchange => "token_exchange",
            Self::ResourceFetch => "resource_fetch",
            Self::ProofGeneration => "proof_generation",
            Self::ProofVerification => "proof_verification",
            Self::MetadataBuild => "metadata_build",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Exchanged,
    Fetched,
    ProofGenerated,
    Verified,
    MetadataBuilt,
    Published,
    Done,
    Failed { stage: Stage, error: PipelineError },
}

impl PipelineState {
    /// The only state this one may advance to on success.
    #[must_use]
    pub fn successor(&self) -> Option<PipelineState> {
        match self {
            Self::Start => Some(Self::Exchanged),
            Self::Exchanged => Some(Self::Fetched),
            Self::Fetched => Some(Self::ProofGenerated),
            Self::ProofGenerated => Some(Self::Verified),
            Self::Verified => Some(Self::MetadataBuilt),
            Self::MetadataBuilt => Some(Self::Published),
            Self::Published => Some(Self::Done),
            Self::Done | Self::Failed { .. } => None,
        }
    }

    /// The stage executed while leaving this state, if any.
    #[must_use]
    pub fn pending_stage(&self) -> Option<Stage> {
        match self {
            Self::Start => Some(Stage::TokenExchange),
            Self::Exchanged => Some(Stage::ResourceFetch),
            Self::Fetched => Some(Stage::ProofGeneration),
            Self::ProofGenerated => Some(Stage::ProofVerification),
            Self::Verified => Some(Stage::MetadataBuild),
            Self::MetadataBuilt => Some(Stage::Publish),
            Self::Published | Self::Done | Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Exchanged => "exchanged",
            Self::Fetched => "fetched",
            Self::ProofGenerated => "proof_generated",
            Self::Verified => "verified",
            Self::MetadataBuilt => "metadata_built",
            Self::Published => "published",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { stage, error } => write!(f, "failed({stage}: {})", error.kind()),
            other => f.write_str(other.name()),
        }
    }
}

/// Tracks one run through the state machine.
#[derive(Debug)]
pub struct RunTracker {
    run_id: Uuid,
    state: PipelineState,
    history: Vec<&'static str>,
    started: Instant,
}

impl RunTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: PipelineState::Start,
            history: vec![PipelineState::Start.name()],
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Names of every state visited, in order.
    #[must_use]
    pub fn history(&self) -> &[&'static str] {
        &self.history
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if `next` is not the successor of the
    /// current state.
    pub fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if self.state.successor().as_ref() != Some(&next) {
            return Err(PipelineError::internal(format!(
                "invalid pipeline transition {} -> {}",
                self.state, next
            )));
        }
        tracing::debug!(run_id = %self.run_id, from = %self.state, to = %next, "pipeline transition");
        self.history.push(next.name());
        self.state = next;
        Ok(())
    }

    /// Records a terminal failure of the pending stage and returns it.
    ///
    /// Failing an already terminal run is reported against the publish stage,
    /// which cannot happen through the orchestrator.
    pub fn fail(&mut self, error: PipelineError) -> Stage {
        let stage = self.state.pending_stage().unwrap_or(Stage::Publish);
        self.history.push("failed");
        self.state = PipelineState::Failed {
            stage,
            error,
        };
        stage
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_full_forward_walk() {
        let mut tracker = RunTracker::new();
        let path = [
            PipelineState::Exchanged,
            PipelineState::Fetched,
            PipelineState::ProofGenerated,
            PipelineState::Verified,
            PipelineState::MetadataBuilt,
            PipelineState::Published,
            PipelineState::Done,
        ];
        for state in path {
            tracker.advance(state).unwrap();
        }
        assert!(tracker.state().is_terminal());
        assert_eq!(tracker.history().len(), 8);
        assert_eq!(tracker.history().last(), Some(&"done"));
    }

    #[test]
    fn test_skip_is_rejected() {
        let mut tracker = RunTracker::new();
        let err = tracker.advance(PipelineState::Fetched).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(tracker.state(), &PipelineState::Start);
    }

    #[test]
    fn test_no_transition_out_of_done() {
        let mut tracker = RunTracker::new();
        for state in [
            PipelineState::Exchanged,
            PipelineState::Fetched,
            PipelineState::ProofGenerated,
            PipelineState::Verified,
            PipelineState::MetadataBuilt,
            PipelineState::Published,
            PipelineState::Done,
        ] {
            tracker.advance(state).unwrap();
        }
        assert!(tracker.advance(PipelineState::Start).is_err());
    }

    #[test]
    fn test_fail_records_pending_stage() {
        let mut tracker = RunTracker::new();
        tracker.advance(PipelineState::Exchanged).unwrap();
        let stage = tracker.fail(PipelineError::no_resource("none"));

        assert_eq!(stage, Stage::ResourceFetch);
        assert!(tracker.state().is_terminal());
        assert!(tracker.advance(PipelineState::Fetched).is_err());
        assert_eq!(tracker.state().to_string(), "failed(resource_fetch: NoResourceError)");
    }

    #[test]
    fn test_timeout_error_kind_matches_stage() {
        assert_eq!(Stage::TokenExchange.timeout_error("t").kind(), ErrorKind::Grant);
        assert_eq!(Stage::ResourceFetch.timeout_error("t").kind(), ErrorKind::ResourceFetch);
        assert_eq!(Stage::ProofGeneration.timeout_error("t").kind(), ErrorKind::ProofGeneration);
        assert_eq!(
            Stage::ProofVerification.timeout_error("t").kind(),
            ErrorKind::ProofVerification
        );
        assert_eq!(Stage::Publish.timeout_error("t").kind(), ErrorKind::Publish);
    }
}
