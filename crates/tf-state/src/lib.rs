//! tf-state: the schema layer, state store, and delta protocol.
//!
//! This crate owns everything about the persisted project record:
//!
//! - **[`types`]** -- the canonical shapes of all persisted data
//!   ([`ProjectState`], [`Trend`], [`Scene`], ...) and their validation.
//! - **[`store`]** -- the durable, file-backed [`StateStore`] with
//!   load / save / reset primitives and atomic persistence.
//! - **[`delta`]** -- the closed set of typed mutation events and
//!   [`apply_delta`], the single sanctioned state-mutation entry point.

pub mod delta;
pub mod store;
pub mod types;

// Re-export key types at the crate root.
pub use delta::{apply_delta, Delta};
pub use store::StateStore;
pub use types::{
    ContinuityConstraints, ProjectState, Scene, Stage, Trend, TrendQuality, MAX_SCENES,
    MIN_SCENES,
};
