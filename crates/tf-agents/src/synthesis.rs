//! Trend synthesis: one abstract trend idea from a seed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tf_core::{Error, Result};
use tf_state::{Delta, Trend};

use crate::model::{strip_code_fence, ModelClient, TextRequest};

/// Produces a [`Delta::TrendSynthesized`] from a seed.
#[async_trait]
pub trait SynthesisAgent: Send + Sync {
    async fn synthesize(&self, seed: u64) -> Result<Delta>;
}

/// Model-backed synthesis agent.
pub struct ModelSynthesisAgent {
    client: Arc<dyn ModelClient>,
    model: String,
}

impl ModelSynthesisAgent {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// Expected shape of the model's answer.
#[derive(Debug, Deserialize)]
struct SynthesisPayload {
    name: String,
    promise: String,
    behavior_pattern: String,
    hook: String,
    collapse_point: String,
    #[serde(default)]
    pattern_analysis: Option<String>,
}

const SYNTHESIS_PROMPT: &str = "\
You are a short-video trend researcher. Invent one plausible, original \
participatory trend. Answer with a single JSON object with keys: \
name, promise, behavior_pattern, hook (why it propagates), collapse_point \
(where its logic breaks down), pattern_analysis (research notes).";

#[async_trait]
impl SynthesisAgent for ModelSynthesisAgent {
    async fn synthesize(&self, seed: u64) -> Result<Delta> {
        tracing::info!(seed, "synthesizing trend");

        let completion = self
            .client
            .complete(TextRequest {
                model: self.model.clone(),
                prompt: SYNTHESIS_PROMPT.to_string(),
                seed,
            })
            .await?;

        let raw = strip_code_fence(&completion);
        let payload: SynthesisPayload = serde_json::from_str(raw).map_err(|e| {
            Error::invalid(
                "agent.synthesis",
                format!("malformed synthesis payload: {e}; payload: {raw}"),
            )
        })?;

        Ok(Delta::TrendSynthesized {
            trend: Trend {
                name: payload.name,
                promise: payload.promise,
                behavior_pattern: payload.behavior_pattern,
                hook: payload.hook,
                collapse_point: payload.collapse_point,
            },
            pattern_analysis: payload.pattern_analysis,
        })
    }
}
