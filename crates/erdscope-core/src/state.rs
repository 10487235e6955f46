//! Persisted diagram view state

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::{ErdError, Result};

/// Current diagram state version - increment when the state structure changes
pub const DIAGRAM_STATE_VERSION: u32 = 1;

/// A point on the diagram canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Position) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Saved view state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: String,
    /// Disambiguates a table and a schema sharing an id. Older states omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    pub position: Position,
    pub hidden: bool,
}

impl EntityState {
    /// Whether this entry applies to a node of `kind` with `id`
    pub fn matches(&self, kind: EntityKind, id: &str) -> bool {
        self.id == id && self.kind.is_none_or(|k| k == kind)
    }
}

/// Versioned, persistable diagram view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramState {
    pub version: u32,
    pub entities: Vec<EntityState>,
}

impl DiagramState {
    pub fn new(entities: Vec<EntityState>) -> Self {
        Self {
            version: DIAGRAM_STATE_VERSION,
            entities,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.version == DIAGRAM_STATE_VERSION
    }

    /// Reject states written by an unknown version
    pub fn ensure_supported(&self) -> Result<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(ErdError::UnsupportedStateVersion {
                found: self.version,
                expected: DIAGRAM_STATE_VERSION,
            })
        }
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&EntityState> {
        self.entities.iter().find(|e| e.matches(kind, id))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for DiagramState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
