//! Pipeline orchestration.
//!
//! - [`state`] - run state machine and transition tracking
//! - [`orchestrator`] - stage sequencing, timeouts and failure reporting

pub mod orchestrator;
pub mod state;

pub use orchestrator::{
    CLAIM_MISMATCH_MESSAGE, Collaborators, PROOF_GENERATION_MESSAGE, PROOF_INVALID_MESSAGE,
    PipelineFailure, PipelineOrchestrator, PipelineOutcome, RunRequest, StageTimeouts,
};
pub use state::{PipelineState, RunTracker, Stage};
