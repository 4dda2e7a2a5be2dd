//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the project paths, quality gate, escalation planning,
//! model endpoints, external tools, and final assembly. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub quality: QualityGateConfig,
    pub planning: PlanningConfig,
    pub model: ModelConfig,
    pub tools: ToolsConfig,
    pub assembly: AssemblyConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::invalid("config", format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=10.0).contains(&self.quality.pass_threshold) {
            warnings.push(format!(
                "quality.pass_threshold {} is outside the score range [0, 10]",
                self.quality.pass_threshold
            ));
        }
        if self.quality.max_attempts == 0 {
            warnings.push("quality.max_attempts is 0; synthesis can never succeed".into());
        }

        if self.planning.scene_count < 4 || self.planning.scene_count > 6 {
            warnings.push(format!(
                "planning.scene_count {} is outside the schema range [4, 6]",
                self.planning.scene_count
            ));
        }

        if self.model.base_url.is_empty() {
            warnings.push("model.base_url is empty; model calls will fail".into());
        }
        if self.model.api_key.is_none() {
            warnings.push("model.api_key is not set".into());
        }

        if self.assembly.transition == TransitionKind::Crossfade
            && self.assembly.transition_duration_secs <= 0.0
        {
            warnings.push(
                "assembly.transition is crossfade but transition_duration_secs is not positive"
                    .into(),
            );
        }

        warnings
    }

    /// Absolute-ish path of the persisted state file.
    pub fn state_path(&self) -> PathBuf {
        self.project.data_dir.join(&self.project.state_file)
    }

    /// Directory where generated artifacts (images, clips, final video) land.
    pub fn artifact_dir(&self) -> PathBuf {
        self.project.data_dir.join("artifacts")
    }

    /// Path of the assembled output video.
    pub fn output_path(&self) -> PathBuf {
        self.project.data_dir.join(&self.assembly.output_file)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Project location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding the state file and generated artifacts.
    pub data_dir: PathBuf,
    /// State file name, relative to `data_dir`.
    pub state_file: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            state_file: "project_state.json".into(),
        }
    }
}

/// Trend quality gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    /// Minimum overall score a trend must reach to pass.
    pub pass_threshold: f32,
    /// Maximum number of synthesis attempts before the gate fails fatally.
    pub max_attempts: u32,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 7.0,
            max_attempts: 3,
        }
    }
}

/// Escalation planning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Number of scenes the planner is asked for (schema allows 4..=6).
    pub scene_count: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self { scene_count: 5 }
    }
}

/// Model API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the generation API.
    pub base_url: String,
    /// Bearer token for the API, if required.
    pub api_key: Option<String>,
    /// Text model identifier used for synthesis, assessment, and planning.
    pub text_model: String,
    /// Image model identifier used for concept images.
    pub image_model: String,
    /// Video model identifier used for scene clips.
    pub video_model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Bounded retry count for transient HTTP failures.
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_key: None,
            text_model: "text-default".into(),
            image_model: "image-default".into(),
            video_model: "video-default".into(),
            timeout_secs: 300,
            max_retries: 2,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Transition applied between adjacent clips during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Hard cut; clips are concatenated as-is.
    Cut,
    /// Crossfade between adjacent clips.
    Crossfade,
}

/// Final assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Normalize all clips to a common profile before concatenation.
    pub normalize: bool,
    /// Target width for normalization.
    pub width: u32,
    /// Target height for normalization.
    pub height: u32,
    /// Target frame rate for normalization.
    pub fps: u32,
    /// Transition between adjacent clips.
    pub transition: TransitionKind,
    /// Crossfade duration in seconds (ignored for cuts).
    pub transition_duration_secs: f32,
    /// Output file name, relative to `project.data_dir`.
    pub output_file: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        // Short-form vertical video profile.
        Self {
            normalize: true,
            width: 1080,
            height: 1920,
            fps: 30,
            transition: TransitionKind::Crossfade,
            transition_duration_secs: 0.5,
            output_file: "final_video.mp4".into(),
        }
    }
}
