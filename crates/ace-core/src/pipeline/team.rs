//! The composite orchestrator.
//!
//! A `TeamManager` owns its child stages in an arena of slots addressed by
//! [`StageId`] handles. Children are moved in by value and leaf stages have no
//! child operations, so the tree is one level deep and acyclic by
//! construction. `run` executes children in canonical order
//! (Generator → Reflector → Curator), one at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::domain::{StageName, Task};
use crate::metrics::METRICS;
use crate::obs;
use crate::pipeline::context::Context;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{canonical_name, Stage};
use crate::pipeline::stages::{CuratorStage, GeneratorStage, ReflectorStage};
use crate::prompts::PromptProvider;
use crate::provider::CompletionProvider;

/// Handle to a registered child. Handles are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(usize);

impl StageId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage#{}", self.0)
    }
}

/// Registered stages per canonical name, and the reply volume they imply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationCounts {
    pub generators: usize,
    pub reflectors: usize,
    pub curators: usize,
    /// Children whose name is not canonical. `run` rejects these.
    pub unrecognized: usize,
}

impl RegistrationCounts {
    pub fn generator_responses(&self) -> usize {
        self.generators
    }

    /// Every reflector stage reflects on every generator reply.
    pub fn reflector_responses(&self) -> usize {
        self.reflectors * self.generator_responses()
    }

    pub fn curator_responses(&self) -> usize {
        self.curators * self.reflector_responses()
    }
}

/// Composite orchestrator for one pipeline team.
pub struct TeamManager {
    name: String,
    slots: Vec<Option<Box<dyn Stage>>>,
    /// Live children in registration order.
    registered: Vec<StageId>,
}

impl TeamManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            registered: Vec::new(),
        }
    }

    /// A team with one Generator, one Reflector and one Curator.
    pub fn standard(
        provider: Arc<dyn CompletionProvider>,
        prompts: Arc<dyn PromptProvider>,
        config: &PipelineConfig,
    ) -> Self {
        let mut team = Self::new(config.team_name.clone());
        team.add_child(GeneratorStage::new(Arc::clone(&provider), Arc::clone(&prompts)));
        team.add_child(
            ReflectorStage::new(Arc::clone(&provider), Arc::clone(&prompts))
                .with_fan_out(config.fan_out.clone()),
        );
        team.add_child(
            CuratorStage::new(provider, prompts).with_fan_out(config.fan_out.clone()),
        );
        team
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a child. Children are owned exclusively by this manager.
    pub fn add_child<S: Stage + 'static>(&mut self, stage: S) -> StageId {
        self.add_boxed_child(Box::new(stage))
    }

    pub fn add_boxed_child(&mut self, stage: Box<dyn Stage>) -> StageId {
        let id = StageId(self.slots.len());
        self.slots.push(Some(stage));
        self.registered.push(id);
        id
    }

    /// Unregister a child and hand it back. `None` if `id` is not registered.
    pub fn remove_child(&mut self, id: StageId) -> Option<Box<dyn Stage>> {
        let stage = self.slots.get_mut(id.0)?.take()?;
        self.registered.retain(|&r| r != id);
        Some(stage)
    }

    /// Registered children with their names, in registration order.
    pub fn list_children(&self) -> Vec<(StageId, &str)> {
        self.children().map(|(id, stage)| (id, stage.name())).collect()
    }

    pub fn child(&self, id: StageId) -> Option<&dyn Stage> {
        self.slots.get(id.0).and_then(|slot| slot.as_deref())
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn registration_counts(&self) -> RegistrationCounts {
        let mut counts = RegistrationCounts::default();
        for (_, stage) in self.children() {
            match canonical_name(stage) {
                Ok(StageName::Generator) => counts.generators += 1,
                Ok(StageName::Reflector) => counts.reflectors += 1,
                Ok(StageName::Curator) => counts.curators += 1,
                Err(_) => counts.unrecognized += 1,
            }
        }
        counts
    }

    /// Children in the order `run` executes them.
    ///
    /// A stable sort of the registration list by canonical index: every
    /// Generator, then every Reflector, then every Curator, each group in
    /// registration order. Fails with `UnrecognizedStage` on the first child
    /// whose name is not canonical.
    pub fn execution_order(&self) -> PipelineResult<Vec<StageId>> {
        Ok(self.plan()?.into_iter().map(|(id, _, _)| id).collect())
    }

    fn plan(&self) -> PipelineResult<Vec<(StageId, StageName, &dyn Stage)>> {
        let mut plan = self
            .children()
            .map(|(id, stage)| canonical_name(stage).map(|name| (id, name, stage)))
            .collect::<PipelineResult<Vec<_>>>()?;
        plan.sort_by_key(|(_, name, _)| name.canonical_index());
        Ok(plan)
    }

    fn children(&self) -> impl Iterator<Item = (StageId, &dyn Stage)> + '_ {
        self.registered
            .iter()
            .filter_map(|&id| self.child(id).map(|stage| (id, stage)))
    }

    /// Execute every child against `task` and return the accumulated context.
    ///
    /// Children run strictly one after another; a child's own fan-out
    /// completes before the next child starts. Any error aborts the run and
    /// no partial context is returned. Call once per task.
    pub async fn run(&self, task: &Task) -> PipelineResult<Context> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id, &self.name);
        self.run_inner(task, &run_id).instrument(span).await
    }

    async fn run_inner(&self, task: &Task, run_id: &str) -> PipelineResult<Context> {
        let start = Instant::now();
        obs::emit_registration_counts(&self.registration_counts());

        let plan = self.plan()?;
        obs::emit_run_started(run_id, &self.name, &task.digest()?, plan.len());
        METRICS.inc_pipeline_runs();

        let mut context = Context::new();
        for (id, name, stage) in plan {
            let stage_start = Instant::now();
            obs::emit_stage_started(id, name);

            let before = context.len_of(name);
            if let Err(err) = stage.act(task, &mut context).await {
                obs::emit_run_failed(run_id, name, &err);
                return Err(err);
            }
            obs::emit_stage_completed(
                id,
                name,
                context.len_of(name) - before,
                saturating_millis(stage_start.elapsed()),
            );
        }

        obs::emit_run_finished(
            run_id,
            saturating_millis(start.elapsed()),
            context.total_entries(),
        );
        Ok(context)
    }
}

/// Whole milliseconds in `elapsed`, pinned at `u64::MAX`.
fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for TeamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamManager")
            .field("name", &self.name)
            .field("children", &self.list_children())
            .finish()
    }
}
