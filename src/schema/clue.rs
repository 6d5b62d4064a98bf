use serde::{Deserialize, Serialize};

use super::npc::Position;

/// A collectible object in a scene.
///
/// The collected flag only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub id: String,
    pub name: String,
    pub description: String,
    pub position: Position,
    pub image_url: String,
    pub knowledge: String,
    #[serde(default)]
    collected: bool,
}

impl Clue {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        position: Position,
        image_url: impl Into<String>,
        knowledge: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            position,
            image_url: image_url.into(),
            knowledge: knowledge.into(),
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Mark as collected. Returns `true` if this call changed the flag.
    pub fn collect(&mut self) -> bool {
        let fresh = !self.collected;
        self.collected = true;
        fresh
    }
}
