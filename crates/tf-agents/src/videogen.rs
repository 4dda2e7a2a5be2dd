//! Per-scene video generation with continuity-frame chaining.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use tf_av::ToolRegistry;
use tf_core::{Error, Result};
use tf_state::{Delta, Scene};

use crate::model::{ModelClient, VideoRequest};

/// Everything the video agent needs for one scene.
pub struct ClipRequest<'a> {
    pub scene: &'a Scene,
    /// Chained continuity frame from the previous scene, or this scene's
    /// own concept image when no chain input exists.
    pub seed_image: Option<&'a Path>,
    pub seed: u64,
    pub artifact_dir: &'a Path,
}

/// Produces a [`Delta::SceneVideoGenerated`] for one scene.
#[async_trait]
pub trait VideoAgent: Send + Sync {
    async fn generate_clip(&self, request: ClipRequest<'_>) -> Result<Delta>;
}

/// Model-backed video generator.
///
/// After the clip is produced its last frame is extracted as the chain
/// input for the next scene; extraction failure is non-fatal (the next
/// scene simply generates without a chained frame).
pub struct ModelVideoAgent {
    client: Arc<dyn ModelClient>,
    model: String,
    tools: Arc<ToolRegistry>,
}

impl ModelVideoAgent {
    pub fn new(
        client: Arc<dyn ModelClient>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            tools,
        }
    }
}

#[async_trait]
impl VideoAgent for ModelVideoAgent {
    async fn generate_clip(&self, request: ClipRequest<'_>) -> Result<Delta> {
        let scene = request.scene;
        let prompt = scene
            .visual_prompt
            .as_deref()
            .ok_or_else(|| Error::missing(format!("{}.visual_prompt", scene.scene_id)))?;

        tracing::info!(
            scene = %scene.scene_id,
            chained = request.seed_image.is_some(),
            "generating clip"
        );

        let clip_path = request.artifact_dir.join(format!("{}.mp4", scene.scene_id));
        let video_clip_path = self
            .client
            .render_video(VideoRequest {
                model: self.model.clone(),
                prompt: prompt.to_string(),
                seed: request.seed,
                seed_image: request.seed_image.map(Path::to_path_buf),
                output: clip_path,
            })
            .await?;

        let frame_path = request
            .artifact_dir
            .join(format!("{}_last.png", scene.scene_id));
        let continuity_frame_path =
            match tf_av::extract_last_frame(&self.tools, &video_clip_path, &frame_path).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(
                        scene = %scene.scene_id,
                        "continuity frame extraction failed, next scene will not chain: {e}"
                    );
                    None
                }
            };

        Ok(Delta::SceneVideoGenerated {
            scene_id: scene.scene_id.clone(),
            video_clip_path,
            continuity_frame_path,
        })
    }
}
