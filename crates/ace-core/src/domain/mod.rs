//! Domain models for the ACE pipeline.
//!
//! Canonical definitions for the data that flows through a run:
//! - `Task`: the caller's query plus a playbook snapshot
//! - `StageName`: the closed set of pipeline roles
//! - `GeneratorResult` / `ReflectorResult` / `CuratorResult`: validated replies

pub mod error;
pub mod results;
pub mod stage_name;
pub mod task;
pub mod validation;

pub use error::ValidationError;
pub use results::{
    BulletTag, CuratorResult, GeneratorResult, Operation, OperationKind, ReflectorResult,
    StageBatch, StageRecord, Tag,
};
pub use stage_name::StageName;
pub use task::{Playbook, PlaybookEntry, Task, EMPTY_PLACEHOLDER};
pub use validation::{FieldKind, FieldSpec};
