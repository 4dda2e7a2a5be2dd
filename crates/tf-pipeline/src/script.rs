//! INIT -> SCRIPTED: quality-gated trend synthesis and escalation planning.

use async_trait::async_trait;

use tf_core::{Error, Result};
use tf_state::{apply_delta, Delta, ProjectState, Stage};

use crate::context::PipelineContext;
use crate::handler::StageHandler;
use crate::runner::transition_stage;

/// Handler for the INIT stage.
pub struct ScriptHandler;

#[async_trait]
impl StageHandler for ScriptHandler {
    fn stage(&self) -> Stage {
        Stage::Init
    }

    async fn run(
        &self,
        ctx: &PipelineContext,
        state: ProjectState,
    ) -> Result<ProjectState> {
        let mut state = state;

        let quality_passed = state
            .trend_quality
            .as_ref()
            .map_or(false, |q| q.passed);

        if state.trend.is_none() {
            state = run_quality_gate(ctx, state).await?;
        } else if !quality_passed {
            // A trend was committed but its passing assessment was not
            // (interrupted mid-gate). The trend is immutable, so re-assess
            // it instead of resynthesizing.
            state = reassess_existing_trend(ctx, state).await?;
        }

        if state.scenes.is_empty() {
            let trend = state
                .trend
                .clone()
                .ok_or_else(|| Error::missing("trend"))?;
            let delta = ctx
                .agents
                .escalation
                .plan(&trend, state.seed, ctx.config.planning.scene_count)
                .await?;
            state = apply_delta(&ctx.store, &state, delta)?;
        }

        transition_stage(&ctx.store, &state, Stage::Scripted)
    }
}

/// Synthesize under the quality gate: bounded retries with a
/// deterministically perturbed seed, fatal once attempts are exhausted.
async fn run_quality_gate(
    ctx: &PipelineContext,
    mut state: ProjectState,
) -> Result<ProjectState> {
    let max_attempts = ctx.config.quality.max_attempts;
    let threshold = ctx.config.quality.pass_threshold;
    let mut last_reason = String::from("no synthesis attempt was made");

    for attempt in 0..max_attempts {
        // Perturbation is the original seed plus the attempt count.
        let attempt_seed = state.seed.wrapping_add(u64::from(attempt));

        let synthesized = ctx.agents.synthesis.synthesize(attempt_seed).await?;
        let Delta::TrendSynthesized { ref trend, .. } = synthesized else {
            return Err(Error::Internal(
                "synthesis agent returned an unexpected delta kind".into(),
            ));
        };

        let assessed = ctx
            .agents
            .quality
            .assess(trend, attempt_seed, threshold)
            .await?;
        let Delta::TrendQualityAssessed { ref quality } = assessed else {
            return Err(Error::Internal(
                "quality agent returned an unexpected delta kind".into(),
            ));
        };

        if quality.passed {
            state = apply_delta(&ctx.store, &state, synthesized)?;
            state = apply_delta(&ctx.store, &state, assessed)?;
            return Ok(state);
        }

        last_reason = quality.rejection_reason.clone().unwrap_or_else(|| {
            format!("overall {:.1} below threshold {threshold:.1}", quality.overall)
        });
        tracing::warn!(
            attempt = attempt + 1,
            max_attempts,
            "trend rejected by quality gate: {last_reason}"
        );

        // Rejections are bookkept as deltas: regeneration_count climbs.
        state = apply_delta(&ctx.store, &state, assessed)?;
    }

    Err(Error::QualityGate {
        attempts: max_attempts,
        reason: last_reason,
    })
}

/// One re-assessment for a committed trend that lacks a passing assessment.
async fn reassess_existing_trend(
    ctx: &PipelineContext,
    mut state: ProjectState,
) -> Result<ProjectState> {
    let threshold = ctx.config.quality.pass_threshold;
    let trend = state
        .trend
        .clone()
        .ok_or_else(|| Error::missing("trend"))?;

    let assessed = ctx.agents.quality.assess(&trend, state.seed, threshold).await?;
    let Delta::TrendQualityAssessed { ref quality } = assessed else {
        return Err(Error::Internal(
            "quality agent returned an unexpected delta kind".into(),
        ));
    };
    let passed = quality.passed;
    let reason = quality
        .rejection_reason
        .clone()
        .unwrap_or_else(|| "committed trend no longer passes assessment".into());

    state = apply_delta(&ctx.store, &state, assessed)?;
    if passed {
        Ok(state)
    } else {
        Err(Error::QualityGate { attempts: 1, reason })
    }
}
