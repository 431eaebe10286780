//! Pipeline orchestration: stages, the team that sequences them, and the
//! context they write into.
//!
//! # Module layout
//!
//! - [`stage`]: the `Stage` trait, `canonical_name`, `require_upstream`
//! - [`stages`]: `GeneratorStage`, `ReflectorStage`, `CuratorStage`
//! - [`team`]: `TeamManager`, `StageId`, `RegistrationCounts`
//! - [`context`]: `Context`, the append-only result accumulator
//! - [`fanout`]: `fan_out`, `FanOutConfig`
//! - [`error`]: `PipelineError`, `PipelineResult`

pub mod context;
pub mod error;
pub mod fanout;
pub mod stage;
pub mod stages;
pub mod team;

pub use context::Context;
pub use error::{PipelineError, PipelineResult};
pub use fanout::{fan_out, FanOutConfig, DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT_ENV};
pub use stage::{canonical_name, require_upstream, Stage};
pub use stages::{CuratorStage, GeneratorStage, ReflectorStage};
pub use team::{RegistrationCounts, StageId, TeamManager};
