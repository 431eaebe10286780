//! ACE Core Library
//!
//! Generator → Reflector → Curator orchestration over a pluggable completion
//! provider. A [`TeamManager`] runs its stages in canonical order against one
//! [`Task`] and returns the accumulated [`Context`].

pub mod config;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod telemetry;

pub use config::{PipelineConfig, DEFAULT_TEAM_NAME};

pub use domain::{
    BulletTag, CuratorResult, GeneratorResult, Operation, OperationKind, Playbook,
    PlaybookEntry, ReflectorResult, StageName, StageRecord, Tag, Task, ValidationError,
    EMPTY_PLACEHOLDER,
};

pub use pipeline::{
    Context, CuratorStage, FanOutConfig, GeneratorStage, PipelineError, PipelineResult,
    ReflectorStage, RegistrationCounts, Stage, StageId, TeamManager,
};

pub use prompts::{
    render_template, CuratorPrompt, GeneratorPrompt, PromptError, PromptProvider,
    ReflectorPrompt, TemplatePrompts,
};

pub use provider::{decode_reply, CompletionProvider, ProviderError, ProviderResult, ResponseMap};

pub use metrics::METRICS;
pub use telemetry::init_tracing;
