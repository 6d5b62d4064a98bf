//! Playback of a generated game: scene progression, NPC conversations and
//! clue collection.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::template::{fill, Bindings};
use crate::llm::provider::ProviderKind;
use crate::llm::LanguageModel;
use crate::schema::game::GeneratedGame;
use crate::schema::npc::{DialogLine, Npc, DEFAULT_PERSONALITY};
use crate::schema::scene::Scene;

pub const SYSTEM_SPEAKER: &str = "系统";
pub const PLAYER_SPEAKER: &str = "你";
pub const WELCOME: &str = "欢迎来到基于您IP的点击式解谜游戏！点击场景中的元素进行互动，与NPC对话获取线索。";
pub const SCENE_COMPLETE: &str = "恭喜！你已收集完当前场景所有线索，可以前往下一场景了！";
pub const ELEMENT_FOUND: &str = "你找到了一个重要物品，这可能对解开谜题有帮助！";

fn greetings(personality: &str) -> &'static [&'static str] {
    match personality {
        "友好" => &[
            "哎呀，欢迎欢迎！我是{name}，很高兴见到你！",
            "你好呀！我是这里的{role}{name}，有什么我能帮忙的吗？",
        ],
        "敌对" => &[
            "哼，又是一个外来者。我是{name}，有话快说。",
            "你来这里干什么？我是{role}{name}，警告你别惹麻烦。",
        ],
        "幽默" => &[
            "哟，来客人啦！我是{name}，这里的{role}兼气氛担当！",
            "欢迎来到我的世界！我是{name}，有什么能为你效劳的吗？",
        ],
        "严肃" => &[
            "我是{name}，{role}。请说明你的来意。",
            "作为{role}，我需要知道你的目的。",
        ],
        _ => &[
            "你好，我是{name}。作为这里的{role}，有什么可以帮助你的吗？",
            "我是{name}，负责这里的{role}工作。需要什么帮助吗？",
        ],
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlayError {
    #[error("no NPC '{0}' in the current scene")]
    NpcNotFound(String),
    #[error("no clue '{0}' in the current scene")]
    ClueNotFound(String),
    #[error("the game has no scenes")]
    NoScene,
}

/// Result of collecting a clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClueOutcome {
    /// `false` when the clue had already been collected.
    pub fresh: bool,
    pub scene_complete: bool,
}

/// One run through a generated game. Mutations stay inside the session's copy.
pub struct PlaySession {
    game: GeneratedGame,
    scene_index: usize,
    log: Vec<DialogLine>,
}

impl PlaySession {
    pub fn new(game: GeneratedGame) -> Self {
        Self {
            game,
            scene_index: 0,
            log: vec![DialogLine::new(SYSTEM_SPEAKER, WELCOME)],
        }
    }

    pub fn game(&self) -> &GeneratedGame {
        &self.game
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.game.scenes.get(self.scene_index)
    }

    /// System and event lines, oldest first.
    pub fn log(&self) -> &[DialogLine] {
        &self.log
    }

    /// Conversation history with one NPC of the current scene.
    pub fn dialog(&self, npc_id: &str) -> Option<&[DialogLine]> {
        self.current_scene()
            .and_then(|s| s.npc(npc_id))
            .map(|n| n.dialog.as_slice())
    }

    fn scene_mut(&mut self) -> Result<&mut Scene, PlayError> {
        self.game
            .scenes
            .get_mut(self.scene_index)
            .ok_or(PlayError::NoScene)
    }

    fn npc_mut(&mut self, npc_id: &str) -> Result<&mut Npc, PlayError> {
        self.scene_mut()?
            .npc_mut(npc_id)
            .ok_or_else(|| PlayError::NpcNotFound(npc_id.to_string()))
    }

    /// Open a conversation: clears the NPC's history and returns its greeting.
    pub fn greet(&mut self, npc_id: &str, rng: &mut StdRng) -> Result<String, PlayError> {
        let npc = self.npc_mut(npc_id)?;
        let lines = greetings(&npc.personality);
        let line = lines
            .choose(rng)
            .copied()
            .unwrap_or(greetings(DEFAULT_PERSONALITY)[0]);
        let bindings = Bindings::new()
            .with("name", npc.name.as_str())
            .with("role", npc.role.as_str());
        let greeting = fill(line, &bindings);

        npc.dialog = vec![DialogLine::new(npc.name.clone(), greeting.clone())];
        Ok(greeting)
    }

    /// Send a player line and record the NPC's reply. Blank messages are ignored
    /// and yield `Ok(None)`. A failed model call answers from the role-keyed
    /// fallback lines.
    pub async fn talk(
        &mut self,
        llm: &LanguageModel,
        npc_id: &str,
        message: &str,
    ) -> Result<Option<String>, PlayError> {
        if message.trim().is_empty() {
            return Ok(None);
        }
        let npc = self.npc_mut(npc_id)?;
        npc.dialog.push(DialogLine::new(PLAYER_SPEAKER, message));
        let persona = npc.persona();

        let reply = llm
            .converse(&persona, message, Some(ProviderKind::VolcanoDoubao))
            .await;

        let npc = self.npc_mut(npc_id)?;
        npc.dialog.push(DialogLine::new(npc.name.clone(), reply.clone()));
        Ok(Some(reply))
    }

    /// Mark a clue of the current scene as collected.
    pub fn collect_clue(&mut self, clue_id: &str) -> Result<ClueOutcome, PlayError> {
        let scene = self.scene_mut()?;
        let clue = scene
            .clue_mut(clue_id)
            .ok_or_else(|| PlayError::ClueNotFound(clue_id.to_string()))?;
        let fresh = clue.collect();
        let name = clue.name.clone();
        let scene_complete = scene.all_clues_collected();

        if fresh {
            self.system(format!("你发现了{}！已添加到你的线索收集品中。", name));
            if scene_complete {
                self.system(SCENE_COMPLETE);
            }
        }
        Ok(ClueOutcome { fresh, scene_complete })
    }

    /// Clicking a scene hotspot.
    pub fn inspect_element(&mut self) {
        self.system(ELEMENT_FOUND);
    }

    /// Move to the next scene. Returns `false` on the last scene.
    pub fn advance_scene(&mut self) -> bool {
        if self.scene_index + 1 < self.game.scenes.len() {
            self.scene_index += 1;
            true
        } else {
            false
        }
    }

    fn system(&mut self, text: impl Into<String>) {
        self.log.push(DialogLine::new(SYSTEM_SPEAKER, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fallback::lines_for_role;
    use crate::schema::clue::Clue;
    use crate::schema::npc::Position;
    use crate::schema::project::Project;
    use rand::SeedableRng;

    fn game() -> GeneratedGame {
        let mut first = Scene::initial();
        let npc = first.add_npc("avatar.png");
        npc.name = "老周".to_string();
        npc.role = "酒馆老板".to_string();
        npc.personality = "严肃".to_string();
        first.set_clues(vec![
            Clue::new("c1", "脚印", "", Position::new(20.0, 20.0), "", ""),
            Clue::new("c2", "羊皮纸", "", Position::new(40.0, 60.0), "", ""),
        ]);
        GeneratedGame::snapshot(&Project::new("山海"), &[first, Scene::numbered(2)])
    }

    fn npc_id(session: &PlaySession) -> String {
        session.current_scene().unwrap().npcs[0].id.clone()
    }

    #[test]
    fn starts_with_welcome() {
        let session = PlaySession::new(game());
        assert_eq!(session.log(), &[DialogLine::new(SYSTEM_SPEAKER, WELCOME)]);
        assert_eq!(session.scene_index(), 0);
    }

    #[test]
    fn greeting_follows_personality_and_resets_history() {
        let mut session = PlaySession::new(game());
        let id = npc_id(&session);
        let mut rng = StdRng::seed_from_u64(4);

        session.greet(&id, &mut rng).unwrap();
        let greeting = session.greet(&id, &mut rng).unwrap();
        assert!(greeting == "我是老周，酒馆老板。请说明你的来意。" || greeting == "作为酒馆老板，我需要知道你的目的。");
        assert_eq!(session.dialog(&id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_personality_greets_neutrally() {
        let line = greetings("古怪")[0];
        assert_eq!(line, greetings("中立")[0]);
    }

    #[test]
    fn collecting_reports_completion_once() {
        let mut session = PlaySession::new(game());

        let first = session.collect_clue("c1").unwrap();
        assert_eq!(first, ClueOutcome { fresh: true, scene_complete: false });
        assert_eq!(session.log().last().unwrap().text, "你发现了脚印！已添加到你的线索收集品中。");

        let again = session.collect_clue("c1").unwrap();
        assert!(!again.fresh);

        let last = session.collect_clue("c2").unwrap();
        assert!(last.scene_complete);
        assert_eq!(session.log().last().unwrap().text, SCENE_COMPLETE);
        let before = session.log().len();
        session.collect_clue("c2").unwrap();
        assert_eq!(session.log().len(), before);

        assert_eq!(
            session.collect_clue("missing"),
            Err(PlayError::ClueNotFound("missing".to_string()))
        );
    }

    #[test]
    fn advance_stops_at_last_scene() {
        let mut session = PlaySession::new(game());
        assert!(session.advance_scene());
        assert_eq!(session.current_scene().unwrap().name, "新场景 2");
        assert!(!session.advance_scene());
        assert_eq!(session.scene_index(), 1);
    }

    #[tokio::test]
    async fn talk_records_both_sides() {
        let mut session = PlaySession::new(game());
        let id = npc_id(&session);
        let llm = LanguageModel::offline(1);

        assert_eq!(session.talk(&llm, &id, "   ").await, Ok(None));
        let reply = session.talk(&llm, &id, "最近有什么怪事？").await.unwrap().unwrap();
        assert!(!reply.is_empty());

        let dialog = session.dialog(&id).unwrap();
        assert_eq!(dialog.len(), 2);
        assert_eq!(dialog[0], DialogLine::new(PLAYER_SPEAKER, "最近有什么怪事？"));
        assert_eq!(dialog[1].speaker, "老周");
    }

    #[tokio::test]
    async fn talk_answers_from_role_lines_when_model_unavailable() {
        let mut session = PlaySession::new(game());
        let id = npc_id(&session);
        let llm = LanguageModel::new(ProviderKind::Coze, 0);
        for _ in 0..5 {
            let reply = session.talk(&llm, &id, "你好").await.unwrap().unwrap();
            assert!(lines_for_role("酒馆老板").contains(&reply.as_str()));
        }
        assert_eq!(session.dialog(&id).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn talk_to_unknown_npc_is_error() {
        let mut session = PlaySession::new(game());
        let llm = LanguageModel::offline(0);
        assert_eq!(
            session.talk(&llm, "ghost", "你好").await,
            Err(PlayError::NpcNotFound("ghost".to_string()))
        );
    }
}
