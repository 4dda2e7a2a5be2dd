//! tf-av: adapters for the external media tools (ffmpeg / ffprobe).
//!
//! This crate provides:
//!
//! - **[`ToolCommand`]** -- a builder for executing tool invocations with a
//!   timeout and captured output.
//! - **[`ToolRegistry`]** -- discovery of ffmpeg and ffprobe on `PATH` (or
//!   via config overrides).
//! - **[`extract_last_frame`]** -- still-image extraction for continuity
//!   chaining.
//! - **[`concat_clips`]** -- ordered concatenation with optional
//!   normalization and crossfade transitions.
//! - **[`probe_clip`]** -- duration / resolution / frame-rate / codec
//!   reporting.

pub mod command;
pub mod concat;
pub mod frames;
pub mod probe;
pub mod tools;

// Re-export key types at the crate root.
pub use command::{ToolCommand, ToolOutput};
pub use concat::{concat_clips, ConcatOptions, NormalizeProfile, Transition};
pub use frames::extract_last_frame;
pub use probe::{probe_clip, ClipInfo};
pub use tools::{ToolInfo, ToolRegistry};
