//! Error types for pipeline orchestration.

use crate::domain::{StageName, ValidationError};
use crate::prompts::PromptError;
use crate::provider::ProviderError;

/// Errors produced by the orchestration layer. A run is all-or-nothing: any
/// of these aborts it and no partial `Context` is returned.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{stage} stage requires {requires} output in context")]
    Precondition {
        stage: StageName,
        requires: StageName,
    },

    #[error("provider error in {stage} stage: {source}")]
    Provider {
        stage: StageName,
        #[source]
        source: ProviderError,
    },

    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("unrecognized stage name: {name:?} (expected Generator, Reflector or Curator)")]
    UnrecognizedStage { name: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, PipelineError::Precondition { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, PipelineError::Provider { .. })
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
