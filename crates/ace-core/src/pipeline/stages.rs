//! The Generator, Reflector and Curator stages.
//!
//! Each stage renders its requests through the `PromptProvider`, sends them to
//! the `CompletionProvider`, validates every reply into its typed record and
//! commits the records to the `Context` only after all of them succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{
    CuratorResult, GeneratorResult, ReflectorResult, StageName, StageRecord, Task,
    EMPTY_PLACEHOLDER,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::pipeline::context::Context;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fanout::{fan_out, FanOutConfig};
use crate::pipeline::stage::{require_upstream, Stage};
use crate::prompts::{CuratorPrompt, GeneratorPrompt, PromptProvider, ReflectorPrompt};
use crate::provider::CompletionProvider;

/// Send one request and validate the reply as `R`.
async fn complete_record<R: StageRecord>(
    provider: &dyn CompletionProvider,
    request: &str,
) -> PipelineResult<R> {
    METRICS.inc_completion_calls();
    let reply = provider
        .complete(request)
        .await
        .map_err(|source| PipelineError::Provider {
            stage: R::STAGE,
            source,
        })?;

    R::from_response(&reply).map_err(|err| {
        METRICS.inc_validation_failures();
        obs::emit_validation_failed(&err);
        PipelineError::Validation(err)
    })
}

// ---------------------------------------------------------------------------
// GeneratorStage
// ---------------------------------------------------------------------------

/// Proposes one answer to the task query from the playbook snapshot.
pub struct GeneratorStage {
    provider: Arc<dyn CompletionProvider>,
    prompts: Arc<dyn PromptProvider>,
}

impl GeneratorStage {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: Arc<dyn PromptProvider>) -> Self {
        Self { provider, prompts }
    }
}

#[async_trait]
impl Stage for GeneratorStage {
    fn name(&self) -> &str {
        StageName::Generator.as_str()
    }

    async fn act(&self, task: &Task, context: &mut Context) -> PipelineResult<()> {
        let playbook = task.playbook.to_prompt_text()?;
        let request = self.prompts.generator_prompt(&GeneratorPrompt {
            playbook: &playbook,
            reflection: EMPTY_PLACEHOLDER,
            question: &task.query,
            context: EMPTY_PLACEHOLDER,
        })?;

        let result: GeneratorResult = complete_record(self.provider.as_ref(), &request).await?;
        debug!(
            stage = %StageName::Generator,
            bullet_ids = ?result.bullet_ids,
            "generator reply validated"
        );
        context.append(vec![result]);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ReflectorStage
// ---------------------------------------------------------------------------

/// Diagnoses every Generator attempt, one concurrent call per attempt.
pub struct ReflectorStage {
    provider: Arc<dyn CompletionProvider>,
    prompts: Arc<dyn PromptProvider>,
    fan_out: FanOutConfig,
}

impl ReflectorStage {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: Arc<dyn PromptProvider>) -> Self {
        Self {
            provider,
            prompts,
            fan_out: FanOutConfig::default(),
        }
    }

    pub fn with_fan_out(mut self, config: FanOutConfig) -> Self {
        self.fan_out = config;
        self
    }
}

#[async_trait]
impl Stage for ReflectorStage {
    fn name(&self) -> &str {
        StageName::Reflector.as_str()
    }

    async fn act(&self, task: &Task, context: &mut Context) -> PipelineResult<()> {
        require_upstream(context, StageName::Reflector)?;

        let playbook = task.playbook.to_prompt_text()?;
        let requests = context
            .generator()
            .iter()
            .map(|attempt| {
                self.prompts.reflector_prompt(&ReflectorPrompt {
                    question: &task.query,
                    reasoning_trace: &attempt.reasoning,
                    predicted_answer: &attempt.final_answer,
                    ground_truth_answer: task.ground_truth_or_placeholder(),
                    environment_feedback: task.environment_feedback_or_placeholder(),
                    playbook: &playbook,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let provider = self.provider.as_ref();
        let results: Vec<ReflectorResult> = fan_out(
            StageName::Reflector,
            requests,
            &self.fan_out,
            |_, request| async move { complete_record(provider, &request).await },
        )
        .await?;

        context.append(results);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CuratorStage
// ---------------------------------------------------------------------------

/// Proposes playbook additions from every reflection. Never applies them.
pub struct CuratorStage {
    provider: Arc<dyn CompletionProvider>,
    prompts: Arc<dyn PromptProvider>,
    fan_out: FanOutConfig,
}

impl CuratorStage {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: Arc<dyn PromptProvider>) -> Self {
        Self {
            provider,
            prompts,
            fan_out: FanOutConfig::default(),
        }
    }

    pub fn with_fan_out(mut self, config: FanOutConfig) -> Self {
        self.fan_out = config;
        self
    }
}

#[async_trait]
impl Stage for CuratorStage {
    fn name(&self) -> &str {
        StageName::Curator.as_str()
    }

    async fn act(&self, task: &Task, context: &mut Context) -> PipelineResult<()> {
        require_upstream(context, StageName::Curator)?;

        let playbook = task.playbook.to_prompt_text()?;
        let requests = context
            .reflector()
            .iter()
            .map(|reflection| {
                self.prompts.curator_prompt(&CuratorPrompt {
                    recent_reflection: &reflection.reasoning,
                    current_playbook: &playbook,
                    question_context: &task.query,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let provider = self.provider.as_ref();
        let results: Vec<CuratorResult> = fan_out(
            StageName::Curator,
            requests,
            &self.fan_out,
            |_, request| async move { complete_record(provider, &request).await },
        )
        .await?;

        debug!(
            stage = %StageName::Curator,
            operations = results.iter().map(|r| r.operations.len()).sum::<usize>(),
            "curator proposals validated"
        );
        context.append(results);
        Ok(())
    }
}
