//! Durable, file-backed store for one project's [`ProjectState`].
//!
//! The store exclusively owns the on-disk file. Every write validates the
//! state first and lands via write-temp-then-rename, so a reader never
//! observes a partially written document.

use std::path::{Path, PathBuf};

use chrono::Utc;

use tf_core::{Error, Result};

use crate::types::ProjectState;

/// File-backed state store for a single project.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store for the state file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// If no file exists yet, a fresh initial state is synthesized,
    /// persisted, and returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] if an existing file fails to parse
    /// or validate.
    pub fn load(&self) -> Result<ProjectState> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no state at {}; starting a fresh project", self.path.display());
                let mut state = ProjectState::new(None);
                self.save(&mut state)?;
                return Ok(state);
            }
            Err(e) => return Err(e.into()),
        };

        let state: ProjectState = serde_json::from_str(&contents)
            .map_err(|e| Error::corrupt(&self.path, format!("parse error: {e}")))?;
        state
            .validate()
            .map_err(|e| Error::corrupt(&self.path, e.to_string()))?;

        Ok(state)
    }

    /// Validate, stamp `updated_at`, and atomically persist the state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the state does not validate; this
    /// is a programming-error-class failure, never expected in correct
    /// operation.
    pub fn save(&self, state: &mut ProjectState) -> Result<()> {
        state.validate()?;
        state.updated_at = Utc::now();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| Error::Internal(format!("state serialization failed: {e}")))?;

        // Write to a sibling temp file, then rename into place.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            stage = %state.stage,
            scenes = state.scenes.len(),
            "state persisted to {}",
            self.path.display()
        );
        Ok(())
    }

    /// Discard all progress: create, persist, and return a brand-new
    /// initial state, optionally with a caller-supplied seed.
    pub fn reset(&self, seed: Option<u64>) -> Result<ProjectState> {
        let mut state = ProjectState::new(seed);
        self.save(&mut state)?;
        tracing::info!(
            project_id = %state.project_id,
            seed = state.seed,
            "project reset"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::planned_state;
    use crate::types::Stage;
    use assert_matches::assert_matches;

    fn temp_store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("project_state.json"));
        (dir, store)
    }

    #[test]
    fn load_creates_fresh_state_when_missing() {
        let (_dir, store) = temp_store();
        let state = store.load().unwrap();
        assert_eq!(state.stage, Stage::Init);
        assert!(store.path().exists(), "fresh state must be persisted");
    }

    #[test]
    fn load_is_idempotent() {
        let (_dir, store) = temp_store();
        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let (_dir, store) = temp_store();
        let mut state = planned_state();
        store.save(&mut state).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(state, loaded);
    }

    #[test]
    fn save_stamps_updated_at() {
        let (_dir, store) = temp_store();
        let mut state = planned_state();
        let before = state.updated_at;
        store.save(&mut state).unwrap();
        assert!(state.updated_at >= before);
    }

    #[test]
    fn save_rejects_invalid_state() {
        let (_dir, store) = temp_store();
        let mut state = planned_state();
        state.scenes[0].absurdity_level = 0;
        let err = store.save(&mut state).unwrap_err();
        assert_matches!(err, tf_core::Error::InvalidState { .. });
        assert!(!store.path().exists(), "invalid state must never land on disk");
    }

    #[test]
    fn load_rejects_malformed_json() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{ not json").unwrap();
        let err = store.load().unwrap_err();
        assert_matches!(err, tf_core::Error::CorruptState { .. });
    }

    #[test]
    fn load_rejects_schema_invalid_file() {
        let (_dir, store) = temp_store();
        let mut state = planned_state();
        store.save(&mut state).unwrap();

        // Hand-corrupt the persisted document.
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        doc["scenes"][0]["absurdity_level"] = serde_json::json!(0);
        std::fs::write(store.path(), serde_json::to_string(&doc).unwrap()).unwrap();

        let err = store.load().unwrap_err();
        assert_matches!(err, tf_core::Error::CorruptState { .. });
    }

    #[test]
    fn reset_discards_progress() {
        let (_dir, store) = temp_store();
        let mut state = planned_state();
        store.save(&mut state).unwrap();

        let fresh = store.reset(Some(7)).unwrap();
        assert_eq!(fresh.stage, Stage::Init);
        assert_eq!(fresh.seed, 7);
        assert!(fresh.scenes.is_empty());
        assert_ne!(fresh.run_id, state.run_id);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, fresh);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let (dir, store) = temp_store();
        let mut state = planned_state();
        store.save(&mut state).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
    }
}
