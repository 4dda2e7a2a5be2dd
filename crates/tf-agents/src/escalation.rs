//! Escalation planning: the scene sequence and global continuity.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tf_core::{Error, Result};
use tf_state::{ContinuityConstraints, Delta, Scene, Trend};

use crate::model::{strip_code_fence, ModelClient, TextRequest};

/// Produces a [`Delta::EscalationPlanned`] for an accepted trend.
#[async_trait]
pub trait EscalationAgent: Send + Sync {
    async fn plan(&self, trend: &Trend, seed: u64, scene_count: usize) -> Result<Delta>;
}

/// Model-backed escalation planner.
pub struct ModelEscalationAgent {
    client: Arc<dyn ModelClient>,
    model: String,
}

impl ModelEscalationAgent {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// Expected shape of the model's answer.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    global_continuity: ContinuityPayload,
    scenes: Vec<ScenePayload>,
}

#[derive(Debug, Deserialize)]
struct ContinuityPayload {
    lighting: String,
    camera_axis: String,
    motion_energy: String,
    color_palette: String,
    environment_type: String,
}

#[derive(Debug, Deserialize)]
struct ScenePayload {
    intent: String,
    absurdity_level: u8,
}

#[async_trait]
impl EscalationAgent for ModelEscalationAgent {
    async fn plan(&self, trend: &Trend, seed: u64, scene_count: usize) -> Result<Delta> {
        let prompt = format!(
            "Plan a {scene_count}-scene short video for the trend `{}` \
             ({}). Scene N continues from scene N-1; absurdity_level (1-10) \
             must strictly increase toward the collapse point: {}. \
             Answer with a single JSON object: global_continuity \
             {{lighting, camera_axis, motion_energy, color_palette, \
             environment_type}} and scenes, an array of \
             {{intent, absurdity_level}} in order.",
            trend.name, trend.promise, trend.collapse_point,
        );

        let completion = self
            .client
            .complete(TextRequest {
                model: self.model.clone(),
                prompt,
                seed,
            })
            .await?;

        let raw = strip_code_fence(&completion);
        let payload: PlanPayload = serde_json::from_str(raw).map_err(|e| {
            Error::invalid(
                "agent.escalation",
                format!("malformed plan payload: {e}; payload: {raw}"),
            )
        })?;

        // Scene ids are assigned by position; the planner only names
        // intents and levels.
        let scenes: Vec<Scene> = payload
            .scenes
            .into_iter()
            .enumerate()
            .map(|(i, s)| Scene::planned(i, s.intent, s.absurdity_level))
            .collect();

        tracing::info!(scenes = scenes.len(), "escalation planned for `{}`", trend.name);

        let g = payload.global_continuity;
        Ok(Delta::EscalationPlanned {
            scenes,
            global_continuity: ContinuityConstraints {
                lighting: g.lighting,
                camera_axis: g.camera_axis,
                motion_energy: g.motion_energy,
                color_palette: g.color_palette,
                environment_type: g.environment_type,
            },
        })
    }
}
