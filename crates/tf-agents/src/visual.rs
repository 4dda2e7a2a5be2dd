//! Visual locking: per-scene prompt, scene continuity, and concept image.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tf_core::{Error, Result};
use tf_state::{ContinuityConstraints, Delta, Scene};

use crate::model::{strip_code_fence, ImageRequest, ModelClient, TextRequest};

/// Everything the visual agent needs for one scene.
///
/// `prev_intent` / `next_intent` give the agent narrative context; the
/// global constraints must be echoed verbatim into the generated prompt.
pub struct VisualLockRequest<'a> {
    pub scene: &'a Scene,
    pub prev_intent: Option<&'a str>,
    pub next_intent: Option<&'a str>,
    pub global: &'a ContinuityConstraints,
    pub seed: u64,
    pub artifact_dir: &'a Path,
}

/// Produces a [`Delta::SceneVisualized`] for one scene.
#[async_trait]
pub trait VisualAgent: Send + Sync {
    async fn lock_scene(&self, request: VisualLockRequest<'_>) -> Result<Delta>;
}

/// Model-backed visual locker.
pub struct ModelVisualAgent {
    client: Arc<dyn ModelClient>,
    text_model: String,
    image_model: String,
}

impl ModelVisualAgent {
    pub fn new(
        client: Arc<dyn ModelClient>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }
}

/// Expected shape of the model's answer.
#[derive(Debug, Deserialize)]
struct VisualPayload {
    visual_prompt: String,
    continuity: ContinuityPayload,
}

#[derive(Debug, Deserialize)]
struct ContinuityPayload {
    lighting: String,
    camera_axis: String,
    motion_energy: String,
    color_palette: String,
    environment_type: String,
}

/// Render the global constraints into prompt text, verbatim.
fn continuity_block(global: &ContinuityConstraints) -> String {
    global
        .fields()
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Names of global constraint values the prompt fails to echo verbatim.
fn missing_constraint_echoes(prompt: &str, global: &ContinuityConstraints) -> Vec<&'static str> {
    global
        .fields()
        .iter()
        .filter(|&&(_, value)| !prompt.contains(value))
        .map(|&(name, _)| name)
        .collect()
}

#[async_trait]
impl VisualAgent for ModelVisualAgent {
    async fn lock_scene(&self, request: VisualLockRequest<'_>) -> Result<Delta> {
        let scene = request.scene;
        tracing::info!(scene = %scene.scene_id, "locking visuals");

        let mut prompt = format!(
            "Lock the visuals for one scene of a short video.\n\
             scene intent: {}\nabsurdity level: {}\n\n\
             These global continuity constraints are binding and must be \
             repeated verbatim inside your visual_prompt:\n{}\n",
            scene.intent,
            scene.absurdity_level,
            continuity_block(request.global),
        );
        if let Some(prev) = request.prev_intent {
            prompt.push_str(&format!("\nprevious scene: {prev}"));
        }
        if let Some(next) = request.next_intent {
            prompt.push_str(&format!("\nnext scene: {next}"));
        }
        prompt.push_str(
            "\n\nAnswer with a single JSON object: visual_prompt (a complete \
             image/video generation prompt) and continuity {lighting, \
             camera_axis, motion_energy, color_palette, environment_type} \
             for this scene, consistent with the global constraints.",
        );

        let completion = self
            .client
            .complete(TextRequest {
                model: self.text_model.clone(),
                prompt,
                seed: request.seed,
            })
            .await?;

        let raw = strip_code_fence(&completion);
        let payload: VisualPayload = serde_json::from_str(raw).map_err(|e| {
            Error::invalid(
                "agent.visual",
                format!("malformed visual payload: {e}; payload: {raw}"),
            )
        })?;

        // The model was told to repeat the global constraints verbatim; a
        // drifting answer is worth a warning, never a failure.
        for name in missing_constraint_echoes(&payload.visual_prompt, request.global) {
            tracing::warn!(
                scene = %scene.scene_id,
                "visual_prompt does not echo global continuity `{name}`"
            );
        }

        // Concept image, used as the generation fallback for unchained scenes.
        let image_path = request
            .artifact_dir
            .join(format!("{}_concept.png", scene.scene_id));
        let concept_image_path = self
            .client
            .render_image(ImageRequest {
                model: self.image_model.clone(),
                prompt: payload.visual_prompt.clone(),
                seed: request.seed,
                output: image_path,
            })
            .await?;

        let c = payload.continuity;
        Ok(Delta::SceneVisualized {
            scene_id: scene.scene_id.clone(),
            visual_prompt: payload.visual_prompt,
            continuity: Some(ContinuityConstraints {
                lighting: c.lighting,
                camera_axis: c.camera_axis,
                motion_energy: c.motion_energy,
                color_palette: c.color_palette,
                environment_type: c.environment_type,
            }),
            concept_image_path: Some(concept_image_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuity_block_lists_all_five_fields() {
        let global = ContinuityConstraints {
            lighting: "warm".into(),
            camera_axis: "frontal".into(),
            motion_energy: "calm".into(),
            color_palette: "amber".into(),
            environment_type: "indoor".into(),
        };
        let block = continuity_block(&global);
        for field in ["lighting", "camera_axis", "motion_energy", "color_palette", "environment_type"] {
            assert!(block.contains(field), "missing {field} in:\n{block}");
        }
        assert!(block.contains("warm"));
    }

    #[test]
    fn echo_check_names_dropped_constraints() {
        let global = ContinuityConstraints {
            lighting: "warm".into(),
            camera_axis: "frontal".into(),
            motion_energy: "calm".into(),
            color_palette: "amber".into(),
            environment_type: "indoor".into(),
        };

        let prompt = "a hand rewraps a worn book; warm, frontal, calm, amber";
        assert_eq!(missing_constraint_echoes(prompt, &global), ["environment_type"]);

        let full = format!("{prompt}, indoor");
        assert!(missing_constraint_echoes(&full, &global).is_empty());
    }

    #[test]
    fn payload_parses() {
        let json = r#"{
            "visual_prompt": "a hand rewraps a worn book, warm light",
            "continuity": {
                "lighting": "warm", "camera_axis": "frontal",
                "motion_energy": "calm", "color_palette": "amber",
                "environment_type": "indoor"
            }
        }"#;
        let payload: VisualPayload = serde_json::from_str(json).unwrap();
        assert!(payload.visual_prompt.contains("rewraps"));
    }
}
