//! The [`StageHandler`] trait: one production step per non-terminal stage.

use async_trait::async_trait;

use tf_state::{ProjectState, Stage};

use crate::context::PipelineContext;

/// A handler that drives the project through one stage.
///
/// Handlers call agents, apply the resulting deltas in order (each one is
/// durably committed before the next agent call), and finish by
/// transitioning the state to the stage's single legal successor. They must
/// be resume-aware: work already committed for the current stage is skipped,
/// never redone.
#[async_trait]
pub trait StageHandler: Send + Sync {
    /// The stage this handler runs in.
    fn stage(&self) -> Stage;

    /// Drive the project from `self.stage()` to its successor.
    ///
    /// On error, everything committed so far stays committed; the runner
    /// persists the error message and halts.
    async fn run(&self, ctx: &PipelineContext, state: ProjectState)
        -> tf_core::Result<ProjectState>;
}
