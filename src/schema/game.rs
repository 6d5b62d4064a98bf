use serde::{Deserialize, Serialize};

use super::project::Project;
use super::scene::{new_id, Scene};

/// A playable snapshot of the editor scenes, taken at generation time.
///
/// Later editor changes are not reflected in an existing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedGame {
    pub id: String,
    pub title: String,
    pub project_id: String,
    pub scenes: Vec<Scene>,
}

impl GeneratedGame {
    pub fn snapshot(project: &Project, scenes: &[Scene]) -> Self {
        Self {
            id: new_id("game"),
            title: format!("{} - 解谜游戏", project.name),
            project_id: project.id.clone(),
            scenes: scenes.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached() {
        let project = Project::new("山海");
        let mut scenes = vec![Scene::initial()];
        let game = GeneratedGame::snapshot(&project, &scenes);
        scenes[0].name = "改名".to_string();

        assert_eq!(game.title, "山海 - 解谜游戏");
        assert_eq!(game.project_id, project.id);
        assert_eq!(game.scenes[0].name, "初始场景");
        assert!(game.id.starts_with("game_"));
    }
}
