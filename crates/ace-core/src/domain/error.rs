//! Domain-level error taxonomy for the ACE pipeline.

use super::stage_name::StageName;

/// A provider reply that does not satisfy a result schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{stage} response missing required field: {field}")]
    MissingField { stage: StageName, field: String },

    #[error("{stage} response field {field} has wrong type: expected {expected}, found {found}")]
    WrongType {
        stage: StageName,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{stage} response field {field} is invalid: {reason}")]
    InvalidValue {
        stage: StageName,
        field: String,
        reason: String,
    },
}

impl ValidationError {
    /// The stage whose schema was violated.
    pub fn stage(&self) -> StageName {
        match self {
            ValidationError::MissingField { stage, .. }
            | ValidationError::WrongType { stage, .. }
            | ValidationError::InvalidValue { stage, .. } => *stage,
        }
    }

    /// Dotted path of the offending field, e.g. `bullet_tags[1].tag`.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field, .. }
            | ValidationError::WrongType { field, .. }
            | ValidationError::InvalidValue { field, .. } => field,
        }
    }
}
