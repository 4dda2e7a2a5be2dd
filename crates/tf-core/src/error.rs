//! Unified error type for the trendforge pipeline.
//!
//! All crates funnel their failures into [`Error`]. Variants map onto the
//! failure classes the pipeline distinguishes: schema validation, stage
//! gating, missing data, the quality gate, and external calls (model APIs
//! and media tools).

use std::path::PathBuf;

/// Unified error type covering all failure modes in trendforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An existing state file failed to parse or validate on load.
    #[error("corrupt state at {path}: {message}")]
    CorruptState {
        /// Location of the offending state file.
        path: PathBuf,
        /// What failed (parse error or the first validation failure).
        message: String,
    },

    /// A state value failed schema validation.
    ///
    /// On save or delta application this is a programming-error-class
    /// failure: correct code never produces an invalid state.
    #[error("invalid state at `{field}`: {message}")]
    InvalidState {
        /// Path of the offending field (e.g. `scenes[2].absurdity_level`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// A delta was applied in a stage where it is not legal.
    #[error("delta {delta} is not legal in stage {stage}")]
    IllegalDelta {
        /// The delta kind (e.g. "SCENE_VISUALIZED").
        delta: String,
        /// The current stage of the project.
        stage: String,
    },

    /// A stage transition outside the fixed linear order was attempted.
    #[error("invalid stage transition {from} -> {to}")]
    InvalidTransition {
        /// The stage the project is currently in.
        from: String,
        /// The requested (illegal) destination stage.
        to: String,
    },

    /// A per-scene delta referenced a scene id that does not exist.
    #[error("scene not found: {scene_id}")]
    SceneNotFound {
        /// The scene identifier that was looked up.
        scene_id: String,
    },

    /// Data a stage handler requires is absent from state.
    #[error("missing required data: {field}")]
    MissingData {
        /// The specific missing field.
        field: String,
    },

    /// The trend quality gate rejected every synthesis attempt.
    #[error("quality gate exhausted after {attempts} attempts: {reason}")]
    QualityGate {
        /// How many synthesis attempts were made.
        attempts: u32,
        /// The rejection reason of the final attempt.
        reason: String,
    },

    /// A model API call failed.
    #[error("model error: {0}")]
    Model(String),

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::CorruptState`].
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::CorruptState {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::InvalidState`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidState {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::MissingData`].
    pub fn missing(field: impl Into<String>) -> Self {
        Error::MissingData {
            field: field.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Model`].
    pub fn model(message: impl Into<String>) -> Self {
        Error::Model(message.into())
    }

    /// Whether this error indicates a violated programming invariant
    /// (as opposed to an expected runtime failure).
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidState { .. }
                | Error::IllegalDelta { .. }
                | Error::InvalidTransition { .. }
        )
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
