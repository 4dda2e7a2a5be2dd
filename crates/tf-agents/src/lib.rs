//! tf-agents: the five production agents and the model-client adapter.
//!
//! Agents are stateless: each takes a slice of project state plus
//! configuration and returns one [`tf_state::Delta`] (or several). They
//! never read or write the state file and never talk to one another; all
//! cross-agent information flows through the state the orchestrator holds.
//!
//! Each agent is a small trait with one model-backed implementation, so
//! tests stub them trivially.

pub mod escalation;
pub mod model;
pub mod quality;
pub mod synthesis;
pub mod videogen;
pub mod visual;

// Re-export the agent seams at the crate root.
pub use escalation::{EscalationAgent, ModelEscalationAgent};
pub use model::{HttpModelClient, ImageRequest, ModelClient, TextRequest, VideoRequest};
pub use quality::{ModelQualityAgent, QualityAgent};
pub use synthesis::{ModelSynthesisAgent, SynthesisAgent};
pub use videogen::{ClipRequest, ModelVideoAgent, VideoAgent};
pub use visual::{ModelVisualAgent, VisualAgent, VisualLockRequest};
