//! Project store: the project list, the active project and its knowledge base.
//!
//! There is always at least one project and the active index always points at
//! one of them. Every mutation writes the whole list back to storage.

pub mod storage;

use std::sync::Arc;

use thiserror::Error;

use crate::schema::asset::{Asset, AssetUpload};
use crate::schema::game::GeneratedGame;
use crate::schema::project::{Project, DEFAULT_PROJECT_NAME, NEW_PROJECT_NAME};
use crate::schema::scene::Scene;
use storage::Storage;

pub const PROJECTS_KEY: &str = "gameProjects";

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("at least one project must remain")]
    LastProject,
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("project name must not be blank")]
    EmptyName,
    #[error("the active project has no knowledge-base assets")]
    EmptyKnowledgeBase,
    #[error("asset '{0}' not found in the active project")]
    AssetNotFound(String),
}

pub struct ProjectStore {
    storage: Arc<dyn Storage + Send + Sync>,
    projects: Vec<Project>,
    active: usize,
}

impl ProjectStore {
    /// Restore the project list. Never fails: missing, empty or corrupted data
    /// yields a single default project. Nothing is written back until the
    /// first mutation.
    pub fn load(storage: Arc<dyn Storage + Send + Sync>) -> Self {
        let projects = match storage.read(PROJECTS_KEY) {
            Ok(Some(raw)) => match decode(&raw) {
                Some(projects) => projects,
                None => {
                    log::error!("stored projects are corrupted, starting fresh");
                    if let Err(e) = storage.remove(PROJECTS_KEY) {
                        log::error!("could not remove corrupted projects: {}", e);
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("project read failed: {}", e);
                Vec::new()
            }
        };

        let projects = if projects.is_empty() {
            vec![Project::new(DEFAULT_PROJECT_NAME)]
        } else {
            log::info!("loaded {} projects", projects.len());
            projects
        };

        Self {
            storage,
            projects,
            active: 0,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn active(&self) -> &Project {
        &self.projects[self.active]
    }

    fn index_of(&self, project_id: &str) -> Result<usize, StoreError> {
        self.projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))
    }

    /// Add a project and make it active. A blank name becomes `新游戏项目`.
    pub fn create(&mut self, name: &str) -> &Project {
        let name = match name.trim() {
            "" => NEW_PROJECT_NAME,
            _ => name,
        };
        self.projects.push(Project::new(name));
        self.active = self.projects.len() - 1;
        self.persist();
        self.active()
    }

    pub fn rename(&mut self, project_id: &str, name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let index = self.index_of(project_id)?;
        self.projects[index].name = name.to_string();
        self.persist();
        Ok(())
    }

    /// Delete a project. The last remaining project cannot be deleted.
    /// Deleting the active project activates the first remaining one.
    pub fn delete(&mut self, project_id: &str) -> Result<(), StoreError> {
        if self.projects.len() <= 1 {
            return Err(StoreError::LastProject);
        }
        let index = self.index_of(project_id)?;
        self.projects.remove(index);

        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        self.persist();
        Ok(())
    }

    pub fn set_active(&mut self, project_id: &str) -> Result<(), StoreError> {
        self.active = self.index_of(project_id)?;
        Ok(())
    }

    /// Classify uploads and append them to the active project's knowledge base.
    /// Returns the classified assets.
    pub fn ingest_assets(&mut self, uploads: Vec<AssetUpload>) -> Vec<Asset> {
        let assets: Vec<Asset> = uploads
            .into_iter()
            .map(|upload| {
                let mut asset = Asset::from_upload(upload);
                asset.classify();
                asset
            })
            .collect();

        self.projects[self.active]
            .knowledge_base
            .extend(assets.iter().cloned());
        log::info!(
            "added {} assets to {}",
            assets.len(),
            self.projects[self.active].name
        );
        self.persist();
        assets
    }

    pub fn remove_asset(&mut self, asset_id: &str) -> Result<(), StoreError> {
        let knowledge_base = &mut self.projects[self.active].knowledge_base;
        let before = knowledge_base.len();
        knowledge_base.retain(|a| a.id != asset_id);
        if knowledge_base.len() == before {
            return Err(StoreError::AssetNotFound(asset_id.to_string()));
        }
        self.persist();
        Ok(())
    }

    /// Snapshot the editor scenes into a playable game for the active project.
    pub fn generate_game(&self, scenes: &[Scene]) -> Result<GeneratedGame, StoreError> {
        let project = self.active();
        if project.knowledge_base.is_empty() {
            return Err(StoreError::EmptyKnowledgeBase);
        }
        Ok(GeneratedGame::snapshot(project, scenes))
    }

    // Write failures keep the in-memory state.
    fn persist(&self) {
        let json = match serde_json::to_string(&self.projects) {
            Ok(json) => json,
            Err(e) => {
                log::error!("project encode failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(PROJECTS_KEY, &json) {
            log::error!("project write failed: {}", e);
        }
    }
}

// `None` when the blob is not a JSON array of objects.
fn decode(raw: &str) -> Option<Vec<Project>> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("project blob is not JSON: {}", e);
            return None;
        }
    };
    let records = value.as_array()?;
    if let Some(bad) = records.iter().find(|r| !r.is_object()) {
        log::warn!("project record is not an object: {}", bad);
        return None;
    }
    Some(records.iter().map(Project::from_json_lenient).collect())
}
