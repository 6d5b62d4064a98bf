pub mod asset;
pub mod clue;
pub mod game;
pub mod npc;
pub mod project;
pub mod scene;
