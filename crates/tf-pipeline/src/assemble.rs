//! VIDEO_GENERATED -> ASSEMBLED: normalize and concatenate the clips.

use std::path::PathBuf;

use async_trait::async_trait;

use tf_av::{concat_clips, ConcatOptions, NormalizeProfile, Transition};
use tf_core::config::TransitionKind;
use tf_core::{Error, Result};
use tf_state::{ProjectState, Stage};

use crate::context::PipelineContext;
use crate::handler::StageHandler;
use crate::runner::transition_stage;

/// Handler for the VIDEO_GENERATED stage.
pub struct AssembleHandler;

#[async_trait]
impl StageHandler for AssembleHandler {
    fn stage(&self) -> Stage {
        Stage::VideoGenerated
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        state: ProjectState,
    ) -> Result<ProjectState> {
        let mut clips: Vec<PathBuf> = Vec::with_capacity(state.scenes.len());
        for (i, scene) in state.scenes.iter().enumerate() {
            let clip = scene
                .video_clip_path
                .clone()
                .ok_or_else(|| Error::missing(format!("scenes[{i}].video_clip_path")))?;
            clips.push(clip);
        }

        let assembly = &ctx.config.assembly;
        let opts = ConcatOptions {
            transition: match assembly.transition {
                TransitionKind::Cut => Transition::Cut,
                TransitionKind::Crossfade => Transition::Crossfade {
                    duration_secs: assembly.transition_duration_secs,
                },
            },
            normalize: assembly.normalize.then_some(NormalizeProfile {
                width: assembly.width,
                height: assembly.height,
                fps: assembly.fps,
            }),
        };

        let output = ctx.config.output_path();
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let final_path = concat_clips(&ctx.tools, &clips, &output, &opts).await?;
        tracing::info!("final video assembled at {}", final_path.display());

        transition_stage(&ctx.store, &state, Stage::Assembled)
    }
}
