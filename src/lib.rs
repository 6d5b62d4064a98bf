//! Puzzle Forge: content generation core for IP-driven point-and-click
//! puzzle games.
//!
//! Template generators produce scene narratives, NPC personas, props, puzzles
//! and clues locally from seeded randomness. Remote language-model and image
//! backends enrich that content when reachable and are replaced by local
//! substitutes when they are not. Projects and their knowledge bases live in
//! a store backed by a pluggable key-value port.

pub mod config;
pub mod core;
pub mod image;
pub mod llm;
pub mod schema;
pub mod store;
pub(crate) mod transport;

pub use config::{ConfigError, EngineConfig};
pub use image::ImageFacade;
pub use llm::error::{ErrorKind, ProviderError};
pub use llm::provider::ProviderKind;
pub use llm::LanguageModel;
pub use store::storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{ProjectStore, StoreError};
