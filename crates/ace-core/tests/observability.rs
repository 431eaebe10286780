//! Log output of pipeline runs.

use std::sync::Arc;

use ace_core::fakes::{canned_reply, ScriptedProvider};
use ace_core::obs::{
    emit_fan_out_dispatched, emit_run_failed, emit_run_finished, emit_validation_failed,
};
use ace_core::{
    PipelineConfig, Playbook, StageName, Task, TeamManager, TemplatePrompts, ValidationError,
    METRICS,
};
use tracing_test::traced_test;

fn team(provider: ScriptedProvider) -> TeamManager {
    TeamManager::standard(
        Arc::new(provider),
        Arc::new(TemplatePrompts::new()),
        &PipelineConfig::default(),
    )
}

#[tokio::test]
#[traced_test]
async fn successful_run_logs_lifecycle_events() {
    team(ScriptedProvider::canned())
        .run(&Task::new("q", Playbook::default()))
        .await
        .unwrap();

    assert!(logs_contain("team.registration"));
    assert!(logs_contain("run.started"));
    assert!(logs_contain("stage.started"));
    assert!(logs_contain("stage.completed"));
    assert!(logs_contain("fanout.dispatched"));
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("team=ImprovementTeam"));
    assert!(!logs_contain("run.failed"));
}

#[tokio::test]
#[traced_test]
async fn invalid_reply_logs_validation_and_run_failure() {
    let mut reply = canned_reply(StageName::Generator);
    reply.remove("reasoning");

    let result = team(ScriptedProvider::constant(reply))
        .run(&Task::new("q", Playbook::default()))
        .await;

    assert!(result.is_err());
    assert!(logs_contain("validation.failed"));
    assert!(logs_contain("field=reasoning"));
    assert!(logs_contain("run.failed"));
}

#[traced_test]
#[test]
fn emit_helpers_write_event_names() {
    emit_fan_out_dispatched(StageName::Curator, 4, 2);
    emit_run_finished("run-9", 120, 7);
    emit_run_failed("run-9", StageName::Reflector, &"boom");
    emit_validation_failed(&ValidationError::InvalidValue {
        stage: StageName::Reflector,
        field: "bullet_tags[0].tag".to_string(),
        reason: "expected one of helpful, harmful, neutral".to_string(),
    });

    assert!(logs_contain("fanout.dispatched"));
    assert!(logs_contain("max_concurrent=2"));
    assert!(logs_contain("total_entries=7"));
    assert!(logs_contain("error=boom"));
    assert!(logs_contain("bullet_tags[0].tag"));
}

#[traced_test]
#[test]
fn metrics_flush_emits_counters() {
    METRICS.flush();
    assert!(logs_contain("completion_calls"));
    assert!(logs_contain("validation_failures"));
}
