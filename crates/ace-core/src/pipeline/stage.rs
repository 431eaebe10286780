//! The executable unit of a pipeline.

use async_trait::async_trait;

use crate::domain::{StageName, Task};
use crate::pipeline::context::Context;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// One named unit of orchestrated work.
///
/// `act` reads the upstream entries it needs from `context` and appends its
/// own results. It is not idempotent: a second call appends again, so a stage
/// runs at most once per pipeline run.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name used to place the stage in the canonical order.
    fn name(&self) -> &str;

    async fn act(&self, task: &Task, context: &mut Context) -> PipelineResult<()>;
}

/// Resolve a stage's name to its canonical role.
pub fn canonical_name(stage: &dyn Stage) -> PipelineResult<StageName> {
    stage
        .name()
        .parse::<StageName>()
        .map_err(|name| PipelineError::UnrecognizedStage { name })
}

/// Fail with a precondition error unless the role `stage` consumes has at
/// least one entry. Roles with no upstream always pass.
pub fn require_upstream(context: &Context, stage: StageName) -> PipelineResult<()> {
    match stage.upstream() {
        Some(upstream) if !context.contains(upstream) => Err(PipelineError::Precondition {
            stage,
            requires: upstream,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Stage for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn act(&self, _task: &Task, _context: &mut Context) -> PipelineResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_canonical_name_accepts_canonical_names() {
        assert_eq!(
            canonical_name(&Named("Reflector")).unwrap(),
            StageName::Reflector
        );
    }

    #[test]
    fn test_canonical_name_rejects_misspelling() {
        match canonical_name(&Named("Reflecter")).unwrap_err() {
            PipelineError::UnrecognizedStage { name } => assert_eq!(name, "Reflecter"),
            other => panic!("Expected UnrecognizedStage, got {:?}", other),
        }
    }

    #[test]
    fn test_require_upstream_on_empty_context() {
        match require_upstream(&Context::new(), StageName::Curator).unwrap_err() {
            PipelineError::Precondition { stage, requires } => {
                assert_eq!(stage, StageName::Curator);
                assert_eq!(requires, StageName::Reflector);
            }
            other => panic!("Expected Precondition, got {:?}", other),
        }
        assert!(require_upstream(&Context::new(), StageName::Generator).is_ok());
    }
}
