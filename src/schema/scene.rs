use serde::{Deserialize, Serialize};

use super::clue::Clue;
use super::npc::{Npc, Position};

pub const INITIAL_BACKGROUND: &str = "https://space.coze.cn/api/coze_space/gen_image?image_size=landscape_16_9&prompt=game%20scene%2C%20mystery%20background%2C%20adventure%20style";
pub const NEW_AREA_BACKGROUND: &str = "https://space.coze.cn/api/coze_space/gen_image?image_size=landscape_16_9&prompt=game%20scene%2C%20new%20area%2C%20adventure%20style";

/// An interactive hotspot placed on the scene background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    pub id: String,
    pub label: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub background: String,
    #[serde(default)]
    pub background_asset_id: Option<String>,
    #[serde(default)]
    pub elements: Vec<SceneElement>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub clues: Vec<Clue>,
    #[serde(default)]
    pub required_clues: usize,
    #[serde(default)]
    pub description: String,
}

impl Scene {
    /// The scene every editor session starts with.
    pub fn initial() -> Self {
        Self::with_background("scene_1", "初始场景", INITIAL_BACKGROUND)
    }

    /// A new scene labelled with its 1-based position in the editor.
    pub fn numbered(n: usize) -> Self {
        Self::with_background(new_id("scene"), format!("新场景 {}", n), NEW_AREA_BACKGROUND)
    }

    fn with_background(
        id: impl Into<String>,
        name: impl Into<String>,
        background: &str,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            background: background.to_string(),
            background_asset_id: None,
            elements: Vec::new(),
            npcs: Vec::new(),
            clues: Vec::new(),
            required_clues: 0,
            description: String::new(),
        }
    }

    pub fn select_background(&mut self, asset_id: &str, url: &str) {
        self.background = url.to_string();
        self.background_asset_id = Some(asset_id.to_string());
    }

    /// Add an NPC with editor defaults and return it for further edits.
    pub fn add_npc(&mut self, avatar: &str) -> &mut Npc {
        let ordinal = self.npcs.len() + 1;
        self.npcs
            .push(Npc::new(new_id("npc"), format!("NPC角色 {}", ordinal), avatar));
        let last = self.npcs.len() - 1;
        &mut self.npcs[last]
    }

    pub fn remove_npc(&mut self, npc_id: &str) -> bool {
        let before = self.npcs.len();
        self.npcs.retain(|n| n.id != npc_id);
        self.npcs.len() != before
    }

    pub fn npc(&self, npc_id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == npc_id)
    }

    pub fn npc_mut(&mut self, npc_id: &str) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id == npc_id)
    }

    /// Replace the clue list; the required count follows the new list.
    pub fn set_clues(&mut self, clues: Vec<Clue>) {
        self.required_clues = clues.len();
        self.clues = clues;
    }

    pub fn clue_mut(&mut self, clue_id: &str) -> Option<&mut Clue> {
        self.clues.iter_mut().find(|c| c.id == clue_id)
    }

    pub fn uncollected_clues(&self) -> usize {
        self.clues.iter().filter(|c| !c.is_collected()).count()
    }

    pub fn all_clues_collected(&self) -> bool {
        self.uncollected_clues() == 0
    }
}

/// `<prefix>_<uuid>`; unique even for ids minted in the same millisecond.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
