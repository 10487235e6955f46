//! Diagram state persistence
//!
//! Saved positions and visibility are stored per connection and schema.

use anyhow::{Context, Result};
use erdscope_core::{DIAGRAM_STATE_VERSION, DiagramState};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::settings_file::{diagrams_dir, ensure_directories};

/// Identifies the diagram of one schema on one connection
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct DiagramStateKey {
    pub connection: String,
    pub schema: Option<String>,
}

impl DiagramStateKey {
    pub fn new(connection: impl Into<String>, schema: Option<&str>) -> Self {
        Self {
            connection: connection.into(),
            schema: schema.map(str::to_string),
        }
    }

    /// Hex SHA-256 of the key, used as the file name.
    ///
    /// A missing schema and an empty schema hash differently.
    pub fn to_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.connection.as_bytes());
        hasher.update([0u8]);
        if let Some(schema) = &self.schema {
            hasher.update([1u8]);
            hasher.update(schema.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Directory of saved diagram states
#[derive(Debug, Clone)]
pub struct DiagramStateStore {
    dir: PathBuf,
}

impl DiagramStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the erdscope data directory, creating the erdscope
    /// directories if needed
    pub fn default_location() -> Result<Self> {
        ensure_directories()?;
        diagrams_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &DiagramStateKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hash()))
    }

    /// Load a saved state. States written by another version are ignored.
    pub fn load(&self, key: &DiagramStateKey) -> Result<Option<DiagramState>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read diagram state from {:?}", path))?;
        let state = DiagramState::from_json(&content)
            .with_context(|| "Failed to parse diagram state JSON")?;

        if !state.is_supported() {
            tracing::warn!(
                "Diagram state version mismatch: expected {}, got {}. Ignoring saved state.",
                DIAGRAM_STATE_VERSION,
                state.version
            );
            return Ok(None);
        }

        Ok(Some(state))
    }

    pub fn save(&self, key: &DiagramStateKey, state: &DiagramState) -> Result<()> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create diagrams directory: {:?}", self.dir))?;

        let content = state.to_json()?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write diagram state to {:?}", path))?;

        tracing::debug!(connection = %key.connection, schema = ?key.schema, "saved diagram state");
        Ok(())
    }

    pub fn delete(&self, key: &DiagramStateKey) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete diagram state at {:?}", path))?;
        }
        Ok(())
    }
}
