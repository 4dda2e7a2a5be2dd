//! VISUALIZED -> VIDEO_GENERATED: sequential clip generation with
//! continuity chaining.

use async_trait::async_trait;

use tf_agents::ClipRequest;
use tf_core::{Error, Result};
use tf_state::{apply_delta, ProjectState, Stage};

use crate::context::PipelineContext;
use crate::handler::StageHandler;
use crate::runner::transition_stage;

/// Handler for the VISUALIZED stage.
pub struct VideoHandler;

#[async_trait]
impl StageHandler for VideoHandler {
    fn stage(&self) -> Stage {
        Stage::Visualized
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        state: ProjectState,
    ) -> Result<ProjectState> {
        for (i, scene) in state.scenes.iter().enumerate() {
            if scene.visual_prompt.is_none() {
                return Err(Error::missing(format!("scenes[{i}].visual_prompt")));
            }
        }

        let artifact_dir = ctx.artifact_dir()?;
        let mut state = state;

        // Strictly sequential: scene N seeds from scene N-1's continuity
        // frame, which only exists once N-1's clip is committed.
        for i in 0..state.scenes.len() {
            if state.scenes[i].video_clip_path.is_some() {
                tracing::debug!(scene = %state.scenes[i].scene_id, "clip already generated, skipping");
                continue;
            }

            let seed_image = i
                .checked_sub(1)
                .and_then(|p| state.scenes[p].continuity_frame_path.clone())
                .or_else(|| state.scenes[i].concept_image_path.clone());

            let scene = state.scenes[i].clone();
            let delta = ctx
                .agents
                .video
                .generate_clip(ClipRequest {
                    scene: &scene,
                    seed_image: seed_image.as_deref(),
                    seed: state.seed,
                    artifact_dir: &artifact_dir,
                })
                .await?;

            state = apply_delta(&ctx.store, &state, delta)?;
        }

        transition_stage(&ctx.store, &state, Stage::VideoGenerated)
    }
}
