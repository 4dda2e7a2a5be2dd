//! tf-pipeline: the stage state machine.
//!
//! This crate provides:
//!
//! - **[`StageHandler`]** trait -- one handler per non-terminal stage.
//! - **[`PipelineContext`]** -- shared execution context (store, config,
//!   agents, tools).
//! - **Stage handlers** -- scripting (INIT), visual locking (SCRIPTED),
//!   clip generation (VISUALIZED), assembly (VIDEO_GENERATED).
//! - **[`Pipeline`]** -- the execution loop with `run`, `run_from_stage`,
//!   and `reset_and_run`.
//! - **[`lint`]** -- the non-fatal continuity contradiction check.

pub mod assemble;
pub mod context;
pub mod handler;
pub mod lint;
pub mod runner;
pub mod script;
pub mod video;
pub mod visualize;

// Re-export key types at the crate root.
pub use context::{AgentSet, PipelineContext};
pub use handler::StageHandler;
pub use runner::{transition_stage, Pipeline};
