//! Structured observability hooks for pipeline runs.
//!
//! Every event carries an `event` field (`run.started`, `stage.completed`, ...)
//! so log pipelines can filter on it. Events are emitted at `info!` except
//! failures, which go out at `warn!`. Filter with `ACE_LOG` or `RUST_LOG`.

use tracing::{info, warn};

use crate::domain::{StageName, ValidationError};
use crate::pipeline::team::{RegistrationCounts, StageId};

/// Span covering one `TeamManager::run`. Attach with `.instrument(span)`.
pub fn run_span(run_id: &str, team: &str) -> tracing::Span {
    tracing::info_span!("ace.run", run_id = %run_id, team = %team)
}

/// Emit event: registered stage counts and the replies they will produce.
pub fn emit_registration_counts(counts: &RegistrationCounts) {
    info!(
        event = "team.registration",
        generators = counts.generators,
        generator_responses = counts.generator_responses(),
        reflectors = counts.reflectors,
        reflector_responses = counts.reflector_responses(),
        curators = counts.curators,
        curator_responses = counts.curator_responses(),
        unrecognized = counts.unrecognized,
    );
}

pub fn emit_run_started(run_id: &str, team: &str, task_digest: &str, stages: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        team = %team,
        task_digest = %task_digest,
        stages = stages,
    );
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, total_entries: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        total_entries = total_entries,
    );
}

/// Emit event: a stage failed and the run was abandoned.
pub fn emit_run_failed(run_id: &str, stage: StageName, error: &dyn std::fmt::Display) {
    warn!(event = "run.failed", run_id = %run_id, stage = %stage, error = %error);
}

pub fn emit_stage_started(id: StageId, stage: StageName) {
    info!(event = "stage.started", stage_id = id.index(), stage = %stage);
}

pub fn emit_stage_completed(id: StageId, stage: StageName, entries: usize, duration_ms: u64) {
    info!(
        event = "stage.completed",
        stage_id = id.index(),
        stage = %stage,
        entries = entries,
        duration_ms = duration_ms,
    );
}

/// Emit event: a stage dispatched its completion calls.
pub fn emit_fan_out_dispatched(stage: StageName, units: usize, max_concurrent: usize) {
    info!(
        event = "fanout.dispatched",
        stage = %stage,
        units = units,
        max_concurrent = max_concurrent,
    );
}

pub fn emit_validation_failed(error: &ValidationError) {
    warn!(
        event = "validation.failed",
        stage = %error.stage(),
        field = %error.field(),
        error = %error,
    );
}
