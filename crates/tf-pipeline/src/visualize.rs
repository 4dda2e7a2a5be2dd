//! SCRIPTED -> VISUALIZED: sequential visual locking per scene.

use async_trait::async_trait;

use tf_agents::VisualLockRequest;
use tf_core::{Error, Result};
use tf_state::{apply_delta, Delta, ProjectState, Stage};

use crate::context::PipelineContext;
use crate::handler::StageHandler;
use crate::lint;
use crate::runner::transition_stage;

/// Handler for the SCRIPTED stage.
pub struct VisualizeHandler;

#[async_trait]
impl StageHandler for VisualizeHandler {
    fn stage(&self) -> Stage {
        Stage::Scripted
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        state: ProjectState,
    ) -> Result<ProjectState> {
        if state.trend.is_none() {
            return Err(Error::missing("trend"));
        }
        if state.scenes.is_empty() {
            return Err(Error::missing("scenes"));
        }
        let global = state
            .global_continuity
            .clone()
            .ok_or_else(|| Error::missing("global_continuity"))?;

        let artifact_dir = ctx.artifact_dir()?;
        let mut state = state;

        // Strictly sequential: each scene's prompt references its
        // neighbors' intents for narrative coherence.
        for i in 0..state.scenes.len() {
            if state.scenes[i].visual_prompt.is_some() {
                tracing::debug!(scene = %state.scenes[i].scene_id, "already visualized, skipping");
                continue;
            }

            let scene = state.scenes[i].clone();
            let prev_intent = i.checked_sub(1).map(|p| state.scenes[p].intent.clone());
            let next_intent = state.scenes.get(i + 1).map(|s| s.intent.clone());

            let delta = ctx
                .agents
                .visual
                .lock_scene(VisualLockRequest {
                    scene: &scene,
                    prev_intent: prev_intent.as_deref(),
                    next_intent: next_intent.as_deref(),
                    global: &global,
                    seed: state.seed,
                    artifact_dir: &artifact_dir,
                })
                .await?;

            // Heuristic lint; contradictions warn but never block.
            if let Delta::SceneVisualized {
                continuity: Some(ref scene_continuity),
                ..
            } = delta
            {
                for warning in lint::contradictions(&global, scene_continuity) {
                    tracing::warn!(scene = %scene.scene_id, "{warning}");
                }
            }

            state = apply_delta(&ctx.store, &state, delta)?;
        }

        transition_stage(&ctx.store, &state, Stage::Visualized)
    }
}
