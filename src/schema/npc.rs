use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "未知角色";
pub const DEFAULT_PERSONALITY: &str = "中立";
pub const DEFAULT_SPEECH_PATTERN: &str = "标准";

pub const POSITION_RANGE: (f64, f64) = (0.0, 100.0);
pub const SIZE_RANGE: (u32, u32) = (50, 200);

/// A point in scene space, both axes in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How an NPC's persona prompt was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Manual,
    Ai,
}

/// One line of a conversation, attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogLine {
    pub speaker: String,
    pub text: String,
}

impl DialogLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// The fields that drive dialogue generation for a character.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Persona {
    pub name: String,
    pub role: String,
    pub personality: String,
    pub speech_pattern: String,
    /// Free-text persona prompt; may be empty.
    pub prompt: String,
}

impl Persona {
    pub fn new(name: &str, role: &str, personality: &str, speech_pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            personality: personality.to_string(),
            speech_pattern: speech_pattern.to_string(),
            prompt: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub role: String,
    pub avatar: String,
    pub position: Position,
    /// Percent scale, kept within `SIZE_RANGE`.
    pub size: u32,
    #[serde(default = "default_personality")]
    pub personality: String,
    #[serde(default = "default_speech_pattern")]
    pub speech_pattern: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub prompt_mode: PromptMode,
    /// Per play session; not meaningful across sessions.
    #[serde(default)]
    pub dialog: Vec<DialogLine>,
}

fn default_personality() -> String {
    DEFAULT_PERSONALITY.to_string()
}

fn default_speech_pattern() -> String {
    DEFAULT_SPEECH_PATTERN.to_string()
}

impl Npc {
    /// A fresh NPC with editor defaults, centred in the scene.
    pub fn new(id: impl Into<String>, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: DEFAULT_ROLE.to_string(),
            avatar: avatar.into(),
            position: Position::new(50.0, 50.0),
            size: 100,
            personality: default_personality(),
            speech_pattern: default_speech_pattern(),
            prompt: String::new(),
            prompt_mode: PromptMode::Manual,
            dialog: Vec::new(),
        }
    }

    /// Set the position, clamping both axes to `POSITION_RANGE`. NaN becomes the minimum.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Position::new(clamp_percent(x), clamp_percent(y));
    }

    /// Set the scale, clamped to `SIZE_RANGE`.
    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(SIZE_RANGE.0, SIZE_RANGE.1);
    }

    pub fn persona(&self) -> Persona {
        Persona {
            name: self.name.clone(),
            role: self.role.clone(),
            personality: self.personality.clone(),
            speech_pattern: self.speech_pattern.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        POSITION_RANGE.0
    } else {
        v.clamp(POSITION_RANGE.0, POSITION_RANGE.1)
    }
}
