//! The execution loop: dispatch one handler per stage until terminal.

use tf_core::{Error, Result};
use tf_state::{ProjectState, Stage, StateStore};

use crate::assemble::AssembleHandler;
use crate::context::PipelineContext;
use crate::handler::StageHandler;
use crate::script::ScriptHandler;
use crate::video::VideoHandler;
use crate::visualize::VisualizeHandler;

/// Advance `state` to `to` and persist.
///
/// # Errors
///
/// Returns [`Error::InvalidTransition`] unless `to` is the single legal
/// successor of the current stage.
pub fn transition_stage(
    store: &StateStore,
    state: &ProjectState,
    to: Stage,
) -> Result<ProjectState> {
    if state.stage.successor() != Some(to) {
        return Err(Error::InvalidTransition {
            from: state.stage.to_string(),
            to: to.to_string(),
        });
    }

    let mut next = state.clone();
    next.stage = to;
    store.save(&mut next)?;
    tracing::info!(from = %state.stage, to = %to, "stage transition");
    Ok(next)
}

/// The full pipeline: one handler per non-terminal stage, driven in order.
pub struct Pipeline {
    ctx: PipelineContext,
    handlers: Vec<Box<dyn StageHandler>>,
}

impl Pipeline {
    /// Wire up the four stage handlers over the given context.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            handlers: vec![
                Box::new(ScriptHandler),
                Box::new(VisualizeHandler),
                Box::new(VideoHandler),
                Box::new(AssembleHandler),
            ],
        }
    }

    /// Shared context, for inspection (status reporting).
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Run from the persisted stage to completion.
    ///
    /// Each handler commits its own progress as it goes; a failure records
    /// itself in `last_error` on the last committed state and propagates.
    pub async fn run(&self) -> Result<ProjectState> {
        let mut state = self.ctx.store.load()?;

        if state.last_error.take().is_some() {
            // Stale failure note from a previous run; this one starts clean.
            self.ctx.store.save(&mut state)?;
        }

        while !state.stage.is_terminal() {
            let handler = self
                .handlers
                .iter()
                .find(|h| h.stage() == state.stage)
                .ok_or_else(|| {
                    Error::Internal(format!("no handler for stage {}", state.stage))
                })?;

            tracing::info!(stage = %state.stage, "running stage handler");
            match handler.run(&self.ctx, state).await {
                Ok(next) => state = next,
                Err(err) => {
                    self.record_failure(&err);
                    return Err(err);
                }
            }
        }

        tracing::info!("pipeline complete");
        Ok(state)
    }

    /// Rewind to just before `target` and run to completion.
    ///
    /// # Errors
    ///
    /// Rejects `INIT` (it has no predecessor; use a reset) and any target
    /// beyond the stage already reached.
    pub async fn run_from_stage(&self, target: Stage) -> Result<ProjectState> {
        let Some(predecessor) = target.predecessor() else {
            return Err(Error::invalid(
                "stage",
                "cannot rerun from INIT; reset the project instead",
            ));
        };

        let mut state = self.ctx.store.load()?;
        if state.stage < target {
            return Err(Error::InvalidTransition {
                from: state.stage.to_string(),
                to: target.to_string(),
            });
        }

        state.stage = predecessor;
        state.last_error = None;
        self.ctx.store.save(&mut state)?;
        tracing::info!(target = %target, "rewound for rerun");

        self.run().await
    }

    /// Discard all progress and run from scratch.
    pub async fn reset_and_run(&self, seed: Option<u64>) -> Result<ProjectState> {
        self.ctx.store.reset(seed)?;
        self.run().await
    }

    /// Note the failure on the last committed state; best effort only.
    fn record_failure(&self, err: &Error) {
        tracing::error!("stage handler failed: {err}");
        match self.ctx.store.load() {
            Ok(mut committed) => {
                committed.last_error = Some(err.to_string());
                if let Err(save_err) = self.ctx.store.save(&mut committed) {
                    tracing::warn!("could not record failure in state: {save_err}");
                }
            }
            Err(load_err) => {
                tracing::warn!("could not reload state to record failure: {load_err}");
            }
        }
    }
}
