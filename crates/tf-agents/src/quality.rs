//! Trend quality assessment against the configured threshold.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tf_core::{Error, Result};
use tf_state::{Delta, Trend, TrendQuality};

use crate::model::{strip_code_fence, ModelClient, TextRequest};

/// Produces a [`Delta::TrendQualityAssessed`] for a synthesized trend.
#[async_trait]
pub trait QualityAgent: Send + Sync {
    async fn assess(&self, trend: &Trend, seed: u64, threshold: f32) -> Result<Delta>;
}

/// Model-backed quality assessor.
pub struct ModelQualityAgent {
    client: Arc<dyn ModelClient>,
    model: String,
}

impl ModelQualityAgent {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// Expected shape of the model's answer.
#[derive(Debug, Deserialize)]
struct QualityPayload {
    plausibility: f32,
    cloneability: f32,
    lifecycle_completeness: f32,
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[async_trait]
impl QualityAgent for ModelQualityAgent {
    async fn assess(&self, trend: &Trend, seed: u64, threshold: f32) -> Result<Delta> {
        let prompt = format!(
            "Score this short-video trend on three axes, each 0-10. \
             Answer with a single JSON object with keys plausibility, \
             cloneability, lifecycle_completeness, and rejection_reason \
             (a short sentence, or null if the trend is strong).\n\n\
             name: {}\npromise: {}\nbehavior pattern: {}\nhook: {}\ncollapse point: {}",
            trend.name, trend.promise, trend.behavior_pattern, trend.hook, trend.collapse_point,
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
        let payload: QualityPayload = serde_json::from_str(raw).map_err(|e| {
            Error::invalid(
                "agent.quality",
                format!("malformed quality payload: {e}; payload: {raw}"),
            )
        })?;

        let quality = TrendQuality::from_scores(
            payload.plausibility,
            payload.cloneability,
            payload.lifecycle_completeness,
            threshold,
            payload.rejection_reason,
        );
        tracing::info!(
            overall = quality.overall,
            passed = quality.passed,
            "assessed trend `{}`",
            trend.name
        );

        Ok(Delta::TrendQualityAssessed { quality })
    }
}
