//! The delta protocol: the closed set of typed mutation events.
//!
//! A [`Delta`] is legal only while the project occupies the stage its kind
//! is bound to. [`apply_delta`] is the single sanctioned state-mutation
//! entry point: it gates on the stage, merges exactly the fields the
//! payload names, revalidates the full aggregate, and persists before
//! returning. Deltas are applied one at a time, in the order the invoking
//! stage handler produced them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use tf_core::{Error, Result};

use crate::store::StateStore;
use crate::types::{ContinuityConstraints, ProjectState, Scene, Stage, Trend, TrendQuality};

/// A typed, stage-gated mutation of project state.
///
/// This is a deliberately closed set of five kinds; the schema layer and
/// the stage machine both depend on its exhaustiveness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delta {
    /// A trend was synthesized and accepted. Legal in INIT.
    TrendSynthesized {
        trend: Trend,
        #[serde(default)]
        pattern_analysis: Option<String>,
    },
    /// A synthesis attempt was quality-assessed. Legal in INIT.
    ///
    /// Failed assessments are applied too; they bump `regeneration_count`.
    TrendQualityAssessed { quality: TrendQuality },
    /// The scene sequence and global continuity were planned. Legal in INIT.
    EscalationPlanned {
        scenes: Vec<Scene>,
        global_continuity: ContinuityConstraints,
    },
    /// One scene's visuals were locked. Legal in SCRIPTED.
    SceneVisualized {
        scene_id: String,
        visual_prompt: String,
        #[serde(default)]
        continuity: Option<ContinuityConstraints>,
        #[serde(default)]
        concept_image_path: Option<PathBuf>,
    },
    /// One scene's video clip was generated. Legal in VISUALIZED.
    SceneVideoGenerated {
        scene_id: String,
        video_clip_path: PathBuf,
        #[serde(default)]
        continuity_frame_path: Option<PathBuf>,
    },
}

impl Delta {
    /// The wire name of this delta kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Delta::TrendSynthesized { .. } => "TREND_SYNTHESIZED",
            Delta::TrendQualityAssessed { .. } => "TREND_QUALITY_ASSESSED",
            Delta::EscalationPlanned { .. } => "ESCALATION_PLANNED",
            Delta::SceneVisualized { .. } => "SCENE_VISUALIZED",
            Delta::SceneVideoGenerated { .. } => "SCENE_VIDEO_GENERATED",
        }
    }

    /// The only stage in which this delta kind may be applied.
    pub fn required_stage(&self) -> Stage {
        match self {
            Delta::TrendSynthesized { .. }
            | Delta::TrendQualityAssessed { .. }
            | Delta::EscalationPlanned { .. } => Stage::Init,
            Delta::SceneVisualized { .. } => Stage::Scripted,
            Delta::SceneVideoGenerated { .. } => Stage::Visualized,
        }
    }
}

/// Apply one delta to `state`, producing a new validated, persisted state.
///
/// The input state is not mutated; on any error the store's file is left
/// exactly as it was.
///
/// # Errors
///
/// - [`Error::IllegalDelta`] when the current stage does not match the
///   delta's precondition.
/// - [`Error::SceneNotFound`] when a per-scene delta names an unknown scene.
/// - [`Error::InvalidState`] when the merged result fails schema validation
///   (the save is never attempted in that case).
pub fn apply_delta(store: &StateStore, state: &ProjectState, delta: Delta) -> Result<ProjectState> {
    if state.stage != delta.required_stage() {
        return Err(Error::IllegalDelta {
            delta: delta.kind().to_string(),
            stage: state.stage.to_string(),
        });
    }

    let kind = delta.kind();
    let mut next = state.clone();

    match delta {
        Delta::TrendSynthesized {
            trend,
            pattern_analysis,
        } => {
            // A trend is set exactly once per run.
            if next.trend.is_some() {
                return Err(Error::invalid("trend", "trend is immutable once set"));
            }
            next.trend = Some(trend);
            if pattern_analysis.is_some() {
                next.pattern_analysis = pattern_analysis;
            }
        }
        Delta::TrendQualityAssessed { quality } => {
            if !quality.passed {
                next.regeneration_count += 1;
            }
            next.trend_quality = Some(quality);
        }
        Delta::EscalationPlanned {
            scenes,
            global_continuity,
        } => {
            if !next.scenes.is_empty() {
                return Err(Error::invalid("scenes", "escalation is already planned"));
            }
            next.scenes = scenes;
            next.global_continuity = Some(global_continuity);
        }
        Delta::SceneVisualized {
            scene_id,
            visual_prompt,
            continuity,
            concept_image_path,
        } => {
            let scene = find_scene(&mut next, &scene_id)?;
            scene.visual_prompt = Some(visual_prompt);
            if continuity.is_some() {
                scene.continuity = continuity;
            }
            if concept_image_path.is_some() {
                scene.concept_image_path = concept_image_path;
            }
        }
        Delta::SceneVideoGenerated {
            scene_id,
            video_clip_path,
            continuity_frame_path,
        } => {
            let scene = find_scene(&mut next, &scene_id)?;
            scene.video_clip_path = Some(video_clip_path);
            if continuity_frame_path.is_some() {
                scene.continuity_frame_path = continuity_frame_path;
            }
        }
    }

    store.save(&mut next)?;
    tracing::debug!(delta = kind, stage = %next.stage, "delta applied");
    Ok(next)
}

fn find_scene<'a>(state: &'a mut ProjectState, scene_id: &str) -> Result<&'a mut Scene> {
    state
        .scenes
        .iter_mut()
        .find(|s| s.scene_id == scene_id)
        .ok_or_else(|| Error::SceneNotFound {
            scene_id: scene_id.to_string(),
        })
}
