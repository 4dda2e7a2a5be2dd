//! Shared test harness for integration tests.
//!
//! Provides stub implementations of the five agents (deterministic, no
//! network, no external tools) plus a [`harness`] constructor that wires
//! them into a [`PipelineContext`] over a temp-dir state store.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tf_agents::{
    ClipRequest, EscalationAgent, QualityAgent, SynthesisAgent, VideoAgent, VisualAgent,
    VisualLockRequest,
};
use tf_av::ToolRegistry;
use tf_core::{Config, Error, Result};
use tf_pipeline::{AgentSet, PipelineContext};
use tf_state::{ContinuityConstraints, Delta, Scene, StateStore, Trend, TrendQuality};

// ---------------------------------------------------------------------------
// Stub agents
// ---------------------------------------------------------------------------

/// Synthesizes a deterministic trend; records every seed it was called with.
pub struct StubSynthesis {
    pub seeds: Mutex<Vec<u64>>,
}

impl StubSynthesis {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seeds: Mutex::new(Vec::new()),
        })
    }

    pub fn seen_seeds(&self) -> Vec<u64> {
        self.seeds.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisAgent for StubSynthesis {
    async fn synthesize(&self, seed: u64) -> Result<Delta> {
        self.seeds.lock().unwrap().push(seed);
        Ok(Delta::TrendSynthesized {
            trend: Trend {
                name: format!("Mirror Pour #{seed}"),
                promise: "pour a drink perfectly mirrored against a screen recording".into(),
                behavior_pattern: "side-by-side split with a previous attempt".into(),
                hook: "near-misses are funnier than successes".into(),
                collapse_point: "pours get staged and the mirror stops mattering".into(),
            },
            pattern_analysis: Some("split-screen imitation formats resurge quarterly".into()),
        })
    }
}

/// Fails the first `fail_first` assessments, then passes every one after.
pub struct StubQuality {
    fail_first: usize,
    pub calls: AtomicUsize,
}

impl StubQuality {
    pub fn passing() -> Arc<Self> {
        Self::failing_first(0)
    }

    pub fn failing_first(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QualityAgent for StubQuality {
    async fn assess(&self, _trend: &Trend, _seed: u64, threshold: f32) -> Result<Delta> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let quality = if n < self.fail_first {
            TrendQuality::from_scores(5.0, 5.0, 5.0, threshold, Some("too derivative".into()))
        } else {
            TrendQuality::from_scores(9.0, 8.0, 8.5, threshold, None)
        };
        Ok(Delta::TrendQualityAssessed { quality })
    }
}

/// Plans a fixed scene sequence with absurdity 2, 4, 6, 8, 10.
pub struct StubEscalation;

impl StubEscalation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl EscalationAgent for StubEscalation {
    async fn plan(&self, trend: &Trend, _seed: u64, scene_count: usize) -> Result<Delta> {
        let scenes = (0..scene_count)
            .map(|i| {
                Scene::planned(
                    i,
                    format!("{} escalation step {}", trend.name, i + 1),
                    (2 * i + 2) as u8,
                )
            })
            .collect();
        Ok(Delta::EscalationPlanned {
            scenes,
            global_continuity: ContinuityConstraints {
                lighting: "warm kitchen light".into(),
                camera_axis: "fixed frontal, counter height".into(),
                motion_energy: "deliberate, slightly tense".into(),
                color_palette: "amber and steel".into(),
                environment_type: "indoor kitchen".into(),
            },
        })
    }
}

/// Locks visuals with a deterministic prompt and writes a dummy concept image.
pub struct StubVisual {
    pub calls: AtomicUsize,
}

impl StubVisual {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisualAgent for StubVisual {
    async fn lock_scene(&self, request: VisualLockRequest<'_>) -> Result<Delta> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scene = request.scene;

        let concept_path = request
            .artifact_dir
            .join(format!("{}_concept.png", scene.scene_id));
        std::fs::write(&concept_path, b"png")?;

        Ok(Delta::SceneVisualized {
            scene_id: scene.scene_id.clone(),
            visual_prompt: format!(
                "{} | {} | {}",
                scene.intent, request.global.lighting, request.global.environment_type
            ),
            continuity: Some(request.global.clone()),
            concept_image_path: Some(concept_path),
        })
    }
}

/// Writes dummy clip and last-frame files; records the chained seed image of
/// every call. Optionally fails after a fixed number of successful clips.
pub struct StubVideo {
    fail_after: Option<usize>,
    pub calls: AtomicUsize,
    pub seed_images: Mutex<Vec<Option<PathBuf>>>,
}

impl StubVideo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_after: None,
            calls: AtomicUsize::new(0),
            seed_images: Mutex::new(Vec::new()),
        })
    }

    /// A video agent that succeeds `n` times and then errors.
    pub fn failing_after(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_after: Some(n),
            calls: AtomicUsize::new(0),
            seed_images: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_seed_images(&self) -> Vec<Option<PathBuf>> {
        self.seed_images.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoAgent for StubVideo {
    async fn generate_clip(&self, request: ClipRequest<'_>) -> Result<Delta> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_after, Some(k) if n >= k) {
            return Err(Error::model("video backend unavailable"));
        }

        self.seed_images
            .lock()
            .unwrap()
            .push(request.seed_image.map(Path::to_path_buf));

        let scene = request.scene;
        let clip_path = request.artifact_dir.join(format!("{}.mp4", scene.scene_id));
        std::fs::write(&clip_path, b"mp4")?;
        let frame_path = request
            .artifact_dir
            .join(format!("{}_last.png", scene.scene_id));
        std::fs::write(&frame_path, b"png")?;

        Ok(Delta::SceneVideoGenerated {
            scene_id: scene.scene_id.clone(),
            video_clip_path: clip_path,
            continuity_frame_path: Some(frame_path),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Handles on the stub agents, kept so tests can inspect call records after
/// handing ownership of the trait objects to the context.
pub struct StubAgents {
    pub synthesis: Arc<StubSynthesis>,
    pub quality: Arc<StubQuality>,
    pub escalation: Arc<StubEscalation>,
    pub visual: Arc<StubVisual>,
    pub video: Arc<StubVideo>,
}

impl StubAgents {
    pub fn all_passing() -> Self {
        Self {
            synthesis: StubSynthesis::new(),
            quality: StubQuality::passing(),
            escalation: StubEscalation::new(),
            visual: StubVisual::new(),
            video: StubVideo::new(),
        }
    }

    pub fn agent_set(&self) -> AgentSet {
        AgentSet {
            synthesis: self.synthesis.clone(),
            quality: self.quality.clone(),
            escalation: self.escalation.clone(),
            visual: self.visual.clone(),
            video: self.video.clone(),
        }
    }
}

/// Build a [`PipelineContext`] rooted in `dir` with the given stub agents.
pub fn harness(dir: &Path, agents: &StubAgents) -> PipelineContext {
    let mut config = Config::default();
    config.project.data_dir = dir.to_path_buf();

    let store = StateStore::new(config.state_path());
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    PipelineContext::with_agents(store, config, agents.agent_set(), tools)
}
