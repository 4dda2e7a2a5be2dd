//! Execution context shared by all stage handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tf_agents::{
    EscalationAgent, HttpModelClient, ModelClient, ModelEscalationAgent, ModelQualityAgent,
    ModelSynthesisAgent, ModelVideoAgent, ModelVisualAgent, QualityAgent, SynthesisAgent,
    VideoAgent, VisualAgent,
};
use tf_av::ToolRegistry;
use tf_core::Config;
use tf_state::StateStore;

/// The five agents the stage handlers call, behind stubbable seams.
pub struct AgentSet {
    pub synthesis: Arc<dyn SynthesisAgent>,
    pub quality: Arc<dyn QualityAgent>,
    pub escalation: Arc<dyn EscalationAgent>,
    pub visual: Arc<dyn VisualAgent>,
    pub video: Arc<dyn VideoAgent>,
}

impl AgentSet {
    /// Build the production agents on top of one shared model client.
    pub fn from_model(
        client: Arc<dyn ModelClient>,
        config: &Config,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let m = &config.model;
        Self {
            synthesis: Arc::new(ModelSynthesisAgent::new(client.clone(), &m.text_model)),
            quality: Arc::new(ModelQualityAgent::new(client.clone(), &m.text_model)),
            escalation: Arc::new(ModelEscalationAgent::new(client.clone(), &m.text_model)),
            visual: Arc::new(ModelVisualAgent::new(
                client.clone(),
                &m.text_model,
                &m.image_model,
            )),
            video: Arc::new(ModelVideoAgent::new(client, &m.video_model, tools)),
        }
    }
}

/// Context passed to every stage handler.
pub struct PipelineContext {
    /// The store owning the persisted state file.
    pub store: StateStore,
    pub config: Config,
    pub agents: AgentSet,
    /// External tool registry (ffmpeg, ffprobe).
    pub tools: Arc<ToolRegistry>,
}

impl PipelineContext {
    /// Assemble the production context: discover tools, build the HTTP
    /// model client, and wire up the agents.
    pub fn production(config: Config) -> Self {
        let store = StateStore::new(config.state_path());
        let tools = Arc::new(ToolRegistry::discover(&config.tools));
        let client: Arc<dyn ModelClient> =
            Arc::new(HttpModelClient::new(config.model.clone()));
        let agents = AgentSet::from_model(client, &config, tools.clone());
        Self {
            store,
            config,
            agents,
            tools,
        }
    }

    /// Build a context from pre-made parts (tests use this with stub agents).
    pub fn with_agents(
        store: StateStore,
        config: Config,
        agents: AgentSet,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            store,
            config,
            agents,
            tools,
        }
    }

    /// Directory where generated artifacts land, created on demand.
    pub fn artifact_dir(&self) -> tf_core::Result<PathBuf> {
        let dir = self.config.artifact_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
