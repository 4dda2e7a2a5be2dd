//! Canonical shapes of all persisted and in-flight pipeline data.
//!
//! Every structure here is schema-validated before it is persisted or
//! accepted from disk: numeric ranges, non-empty strings, scene-id naming,
//! and the strictly increasing absurdity curve. A structurally invalid
//! payload fails loudly and is never silently coerced or defaulted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tf_core::{Error, ProjectId, Result, RunId};

/// Minimum number of scenes a planned project may have.
pub const MIN_SCENES: usize = 4;
/// Maximum number of scenes a planned project may have.
pub const MAX_SCENES: usize = 6;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The five fixed pipeline stages, in their total order.
///
/// A project occupies exactly one stage at a time and only ever advances
/// through the linear order, except via the explicit rerun override or a
/// full reset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Fresh project; no trend accepted yet.
    Init,
    /// Trend accepted and scene sequence planned.
    Scripted,
    /// Every scene carries a locked visual prompt.
    Visualized,
    /// Every scene carries a generated video clip.
    VideoGenerated,
    /// Final video assembled. Terminal; no handler, no successor.
    Assembled,
}

impl Stage {
    /// The single legal successor, or `None` for the terminal stage.
    pub fn successor(self) -> Option<Stage> {
        match self {
            Stage::Init => Some(Stage::Scripted),
            Stage::Scripted => Some(Stage::Visualized),
            Stage::Visualized => Some(Stage::VideoGenerated),
            Stage::VideoGenerated => Some(Stage::Assembled),
            Stage::Assembled => None,
        }
    }

    /// The stage immediately before this one, or `None` for `Init`.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Init => None,
            Stage::Scripted => Some(Stage::Init),
            Stage::Visualized => Some(Stage::Scripted),
            Stage::VideoGenerated => Some(Stage::Visualized),
            Stage::Assembled => Some(Stage::VideoGenerated),
        }
    }

    /// Whether this stage has no outgoing transition.
    pub fn is_terminal(self) -> bool {
        self == Stage::Assembled
    }

    /// The wire/display name (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "INIT",
            Stage::Scripted => "SCRIPTED",
            Stage::Visualized => "VISUALIZED",
            Stage::VideoGenerated => "VIDEO_GENERATED",
            Stage::Assembled => "ASSEMBLED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INIT" => Ok(Stage::Init),
            "SCRIPTED" => Ok(Stage::Scripted),
            "VISUALIZED" => Ok(Stage::Visualized),
            "VIDEO_GENERATED" => Ok(Stage::VideoGenerated),
            "ASSEMBLED" => Ok(Stage::Assembled),
            other => Err(Error::invalid("stage", format!("unknown stage `{other}`"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// A short structured trend idea. Immutable once set in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Catchy trend name.
    pub name: String,
    /// What the trend promises its participants.
    pub promise: String,
    /// The repeatable behavior pattern participants perform.
    pub behavior_pattern: String,
    /// Why the trend propagates.
    pub hook: String,
    /// Where the trend's internal logic breaks down.
    pub collapse_point: String,
}

impl Trend {
    pub(crate) fn validate(&self) -> Result<()> {
        non_empty("trend.name", &self.name)?;
        non_empty("trend.promise", &self.promise)?;
        non_empty("trend.behavior_pattern", &self.behavior_pattern)?;
        non_empty("trend.hook", &self.hook)?;
        non_empty("trend.collapse_point", &self.collapse_point)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TrendQuality
// ---------------------------------------------------------------------------

/// Quality assessment of a synthesized trend against a fixed threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendQuality {
    /// How believable the trend is, in [0, 10].
    pub plausibility: f32,
    /// How easily participants can reproduce it, in [0, 10].
    pub cloneability: f32,
    /// Whether it has a complete rise-and-collapse arc, in [0, 10].
    pub lifecycle_completeness: f32,
    /// Derived overall score (mean of the three sub-scores).
    pub overall: f32,
    /// Whether `overall` met the configured threshold.
    pub passed: bool,
    /// Why the trend was rejected, when it was.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl TrendQuality {
    /// Build an assessment from the three sub-scores, deriving `overall`
    /// and `passed` against the given threshold.
    pub fn from_scores(
        plausibility: f32,
        cloneability: f32,
        lifecycle_completeness: f32,
        threshold: f32,
        rejection_reason: Option<String>,
    ) -> Self {
        let overall = (plausibility + cloneability + lifecycle_completeness) / 3.0;
        Self {
            plausibility,
            cloneability,
            lifecycle_completeness,
            overall,
            passed: overall >= threshold,
            rejection_reason,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        score_in_range("trend_quality.plausibility", self.plausibility)?;
        score_in_range("trend_quality.cloneability", self.cloneability)?;
        score_in_range(
            "trend_quality.lifecycle_completeness",
            self.lifecycle_completeness,
        )?;
        score_in_range("trend_quality.overall", self.overall)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ContinuityConstraints
// ---------------------------------------------------------------------------

/// Descriptive visual constraints enforced across scenes.
///
/// A global instance binds the whole project; per-scene instances must not
/// contradict it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityConstraints {
    pub lighting: String,
    pub camera_axis: String,
    pub motion_energy: String,
    pub color_palette: String,
    pub environment_type: String,
}

impl ContinuityConstraints {
    pub(crate) fn validate(&self, prefix: &str) -> Result<()> {
        non_empty(&format!("{prefix}.lighting"), &self.lighting)?;
        non_empty(&format!("{prefix}.camera_axis"), &self.camera_axis)?;
        non_empty(&format!("{prefix}.motion_energy"), &self.motion_energy)?;
        non_empty(&format!("{prefix}.color_palette"), &self.color_palette)?;
        non_empty(&format!("{prefix}.environment_type"), &self.environment_type)?;
        Ok(())
    }

    /// The five fields as (name, value) pairs, for field-wise comparison.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("lighting", &self.lighting),
            ("camera_axis", &self.camera_axis),
            ("motion_energy", &self.motion_energy),
            ("color_palette", &self.color_palette),
            ("environment_type", &self.environment_type),
        ]
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One ordered unit of production.
///
/// Created empty-bodied during escalation planning, then progressively
/// enriched by later stages. Scenes are never deleted or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Position-tied identifier (`scene_001`, `scene_002`, ...).
    pub scene_id: String,
    /// What happens in this scene.
    pub intent: String,
    /// Escalation level in [1, 10]; strictly increasing across the sequence.
    pub absurdity_level: u8,
    /// Locked generation prompt, set during visual locking.
    #[serde(default)]
    pub visual_prompt: Option<String>,
    /// Scene-level continuity constraints.
    #[serde(default)]
    pub continuity: Option<ContinuityConstraints>,
    /// Concept image produced during visual locking.
    #[serde(default)]
    pub concept_image_path: Option<PathBuf>,
    /// Generated video clip for this scene.
    #[serde(default)]
    pub video_clip_path: Option<PathBuf>,
    /// Last frame of this scene's clip, chained into the next scene.
    #[serde(default)]
    pub continuity_frame_path: Option<PathBuf>,
}

impl Scene {
    /// Create an empty-bodied scene for the given zero-based position.
    pub fn planned(position: usize, intent: impl Into<String>, absurdity_level: u8) -> Self {
        Self {
            scene_id: Self::id_for_position(position),
            intent: intent.into(),
            absurdity_level,
            visual_prompt: None,
            continuity: None,
            concept_image_path: None,
            video_clip_path: None,
            continuity_frame_path: None,
        }
    }

    /// The zero-padded sequential identifier for a zero-based position.
    pub fn id_for_position(position: usize) -> String {
        format!("scene_{:03}", position + 1)
    }

    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        let prefix = format!("scenes[{index}]");

        let expected_id = Self::id_for_position(index);
        if self.scene_id != expected_id {
            return Err(Error::invalid(
                format!("{prefix}.scene_id"),
                format!("expected `{expected_id}`, found `{}`", self.scene_id),
            ));
        }

        non_empty(&format!("{prefix}.intent"), &self.intent)?;

        if !(1..=10).contains(&self.absurdity_level) {
            return Err(Error::invalid(
                format!("{prefix}.absurdity_level"),
                format!("must be in 1..=10, found {}", self.absurdity_level),
            ));
        }

        if let Some(ref prompt) = self.visual_prompt {
            non_empty(&format!("{prefix}.visual_prompt"), prompt)?;
        }
        if let Some(ref continuity) = self.continuity {
            continuity.validate(&format!("{prefix}.continuity"))?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProjectState
// ---------------------------------------------------------------------------

/// The single root aggregate: one project's full pipeline record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub project_id: ProjectId,
    /// Unique per execution attempt.
    pub run_id: RunId,
    /// Quasi-reproducibility knob forwarded to generation calls.
    pub seed: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stage: Stage,
    /// Research notes from trend synthesis.
    #[serde(default)]
    pub pattern_analysis: Option<String>,
    #[serde(default)]
    pub trend: Option<Trend>,
    #[serde(default)]
    pub trend_quality: Option<TrendQuality>,
    /// Ordered scene sequence; scene N continues from scene N-1.
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub global_continuity: Option<ContinuityConstraints>,
    /// Message of the last handler failure, if any.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Monotonic count of quality-gate rejections.
    #[serde(default)]
    pub regeneration_count: u32,
}

impl ProjectState {
    /// Create a fresh initial state, optionally with a caller-supplied seed.
    pub fn new(seed: Option<u64>) -> Self {
        let now = Utc::now();
        Self {
            project_id: ProjectId::new(),
            run_id: RunId::new(),
            seed: seed.unwrap_or_else(rand::random),
            created_at: now,
            updated_at: now,
            stage: Stage::Init,
            pattern_analysis: None,
            trend: None,
            trend_quality: None,
            scenes: Vec::new(),
            global_continuity: None,
            last_error: None,
            regeneration_count: 0,
        }
    }

    /// Validate the full aggregate against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] naming the offending field path.
    pub fn validate(&self) -> Result<()> {
        // Scene count: empty before planning, otherwise within the fixed band.
        if !self.scenes.is_empty()
            && !(MIN_SCENES..=MAX_SCENES).contains(&self.scenes.len())
        {
            return Err(Error::invalid(
                "scenes",
                format!(
                    "planned scene count must be in {MIN_SCENES}..={MAX_SCENES}, found {}",
                    self.scenes.len()
                ),
            ));
        }

        for (i, scene) in self.scenes.iter().enumerate() {
            scene.validate(i)?;
        }

        // Absurdity must climb strictly.
        for (i, pair) in self.scenes.windows(2).enumerate() {
            if pair[0].absurdity_level >= pair[1].absurdity_level {
                return Err(Error::invalid(
                    format!("scenes[{}].absurdity_level", i + 1),
                    format!(
                        "must exceed scenes[{i}].absurdity_level ({} >= {})",
                        pair[0].absurdity_level, pair[1].absurdity_level
                    ),
                ));
            }
        }

        if let Some(ref trend) = self.trend {
            trend.validate()?;
        }
        if let Some(ref quality) = self.trend_quality {
            quality.validate()?;
        }
        if let Some(ref continuity) = self.global_continuity {
            continuity.validate("global_continuity")?;
        }
        if let Some(ref notes) = self.pattern_analysis {
            non_empty("pattern_analysis", notes)?;
        }

        Ok(())
    }

    /// Index of the scene with the given id.
    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.scene_id == scene_id)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn score_in_range(field: &str, value: f32) -> Result<()> {
    if !(0.0..=10.0).contains(&value) {
        Err(Error::invalid(
            field,
            format!("must be in 0..=10, found {value}"),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;

    pub(crate) fn sample_trend() -> Trend {
        Trend {
            name: "Reverse Unboxing".into(),
            promise: "rewrap something you love and give it away".into(),
            behavior_pattern: "film yourself wrapping an owned item as new".into(),
            hook: "inverts a familiar format, so it reads as novel instantly".into(),
            collapse_point: "once everyone rewraps junk, the sincerity is gone".into(),
        }
    }

    pub(crate) fn sample_continuity() -> ContinuityConstraints {
        ContinuityConstraints {
            lighting: "warm late-afternoon sunlight".into(),
            camera_axis: "fixed frontal, chest height".into(),
            motion_energy: "calm, deliberate movements".into(),
            color_palette: "amber and cream".into(),
            environment_type: "indoor living room".into(),
        }
    }

    pub(crate) fn planned_state() -> ProjectState {
        let mut state = ProjectState::new(Some(42));
        state.trend = Some(sample_trend());
        state.trend_quality =
            Some(TrendQuality::from_scores(8.0, 8.5, 7.5, 7.0, None));
        state.global_continuity = Some(sample_continuity());
        state.scenes = (0..5)
            .map(|i| Scene::planned(i, format!("escalation step {}", i + 1), (2 * i + 2) as u8))
            .collect();
        state
    }

    #[test]
    fn stage_order_is_linear() {
        assert_eq!(Stage::Init.successor(), Some(Stage::Scripted));
        assert_eq!(Stage::Scripted.successor(), Some(Stage::Visualized));
        assert_eq!(Stage::Visualized.successor(), Some(Stage::VideoGenerated));
        assert_eq!(Stage::VideoGenerated.successor(), Some(Stage::Assembled));
        assert_eq!(Stage::Assembled.successor(), None);
        assert!(Stage::Assembled.is_terminal());
    }

    #[test]
    fn stage_predecessor_inverts_successor() {
        for stage in [
            Stage::Init,
            Stage::Scripted,
            Stage::Visualized,
            Stage::VideoGenerated,
        ] {
            assert_eq!(stage.successor().unwrap().predecessor(), Some(stage));
        }
        assert_eq!(Stage::Init.predecessor(), None);
    }

    #[test]
    fn stage_total_order() {
        assert!(Stage::Init < Stage::Scripted);
        assert!(Stage::Scripted < Stage::Visualized);
        assert!(Stage::Visualized < Stage::VideoGenerated);
        assert!(Stage::VideoGenerated < Stage::Assembled);
    }

    #[test]
    fn stage_serde_uses_wire_names() {
        let json = serde_json::to_string(&Stage::VideoGenerated).unwrap();
        assert_eq!(json, "\"VIDEO_GENERATED\"");
        let back: Stage = serde_json::from_str("\"SCRIPTED\"").unwrap();
        assert_eq!(back, Stage::Scripted);
    }

    #[test]
    fn stage_from_str() {
        assert_eq!("video_generated".parse::<Stage>().unwrap(), Stage::VideoGenerated);
        assert!("LAUNCHED".parse::<Stage>().is_err());
    }

    #[test]
    fn fresh_state_is_valid() {
        let state = ProjectState::new(None);
        assert_eq!(state.stage, Stage::Init);
        assert_eq!(state.regeneration_count, 0);
        assert!(state.scenes.is_empty());
        state.validate().unwrap();
    }

    #[test]
    fn caller_supplied_seed_is_kept() {
        let state = ProjectState::new(Some(42));
        assert_eq!(state.seed, 42);
    }

    #[test]
    fn planned_state_is_valid() {
        planned_state().validate().unwrap();
    }

    #[test]
    fn scene_id_scheme() {
        assert_eq!(Scene::id_for_position(0), "scene_001");
        assert_eq!(Scene::id_for_position(11), "scene_012");
    }

    #[test]
    fn wrong_scene_id_fails_validation() {
        let mut state = planned_state();
        state.scenes[2].scene_id = "scene_7".into();
        let err = state.validate().unwrap_err();
        assert_matches!(err, Error::InvalidState { ref field, .. } if field == "scenes[2].scene_id");
    }

    #[test]
    fn non_increasing_absurdity_fails_validation() {
        let mut state = planned_state();
        state.scenes[3].absurdity_level = state.scenes[2].absurdity_level;
        let err = state.validate().unwrap_err();
        assert_matches!(err, Error::InvalidState { ref field, .. } if field == "scenes[4].absurdity_level");
    }

    #[test]
    fn absurdity_out_of_range_fails_validation() {
        let mut state = planned_state();
        state.scenes[4].absurdity_level = 11;
        let err = state.validate().unwrap_err();
        assert_matches!(err, Error::InvalidState { ref field, .. } if field == "scenes[4].absurdity_level");
    }

    #[test]
    fn too_few_scenes_fails_validation() {
        let mut state = planned_state();
        state.scenes.truncate(3);
        let err = state.validate().unwrap_err();
        assert_matches!(err, Error::InvalidState { ref field, .. } if field == "scenes");
    }

    #[test]
    fn empty_trend_field_fails_validation() {
        let mut state = planned_state();
        state.trend.as_mut().unwrap().hook = "  ".into();
        let err = state.validate().unwrap_err();
        assert_matches!(err, Error::InvalidState { ref field, .. } if field == "trend.hook");
    }

    #[test]
    fn quality_score_out_of_range_fails_validation() {
        let mut state = planned_state();
        state.trend_quality.as_mut().unwrap().plausibility = -1.0;
        let err = state.validate().unwrap_err();
        assert_matches!(
            err,
            Error::InvalidState { ref field, .. } if field == "trend_quality.plausibility"
        );
    }

    #[test]
    fn quality_from_scores_derives_overall_and_pass() {
        let q = TrendQuality::from_scores(9.0, 8.0, 7.0, 7.0, None);
        assert!((q.overall - 8.0).abs() < f32::EPSILON);
        assert!(q.passed);

        let q = TrendQuality::from_scores(5.0, 5.0, 5.0, 7.0, Some("too flat".into()));
        assert!(!q.passed);
        assert_eq!(q.rejection_reason.as_deref(), Some("too flat"));
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = planned_state();
        let json = serde_json::to_string_pretty(&state).unwrap();
        let back: ProjectState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn scene_index_lookup() {
        let state = planned_state();
        assert_eq!(state.scene_index("scene_003"), Some(2));
        assert_eq!(state.scene_index("scene_099"), None);
    }
}
