/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the editor, the transform client and the UI layer.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generation mode hint sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SketchType {
    #[default]
    Object,
    Scene,
}

impl SketchType {
    /// Every variant, in pick-list order
    pub const ALL: [SketchType; 2] = [SketchType::Object, SketchType::Scene];

    /// Wire value (`model_type` query parameter / JSON field)
    pub fn as_str(self) -> &'static str {
        match self {
            SketchType::Object => "object",
            SketchType::Scene => "scene",
        }
    }
}

impl fmt::Display for SketchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SketchType::Object => "Object",
            SketchType::Scene => "Scene",
        })
    }
}

/// A drawing (or uploaded reference) plus its latest transform result
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub id: Uuid,
    /// Data URL of the sketch itself
    pub image: String,
    pub created_at: DateTime<Utc>,
    /// Data URL of the most recent transform result; overwritten, never accumulated
    pub transformed: Option<String>,
}

impl Sketch {
    pub fn new(image: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            created_at: Utc::now(),
            transformed: None,
        }
    }
}
