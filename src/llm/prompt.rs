use crate::core::template::{fill, Bindings};
use crate::schema::npc::Persona;

const SYSTEM_PROMPT: &str = "你是游戏中的NPC角色{name}，你的身份是{role}。你的性格特点是{personality}，说话风格{speech}。请完全沉浸在这个角色中，用第一人称与玩家对话。

你的回应必须符合以下要求：
1. 始终使用角色的口吻和说话方式
2. 对话应简短自然，符合角色身份
3. 根据玩家的问题和话题，提供符合角色设定的回应
4. 不要透露你是AI或游戏角色的事实
5. 如果玩家的问题与游戏世界无关，可以礼貌地引导回游戏相关话题
6. 每次回应都要有所不同，避免重复之前说过的话";

/// In-character system prompt for `persona`.
pub fn system_prompt(persona: &Persona) -> String {
    let bindings = Bindings::new()
        .with("name", persona.name.as_str())
        .with("role", persona.role.as_str())
        .with("personality", persona.personality.as_str())
        .with("speech", persona.speech_pattern.as_str());
    let mut prompt = fill(SYSTEM_PROMPT, &bindings);

    let extra = persona.prompt.trim();
    if !extra.is_empty() {
        prompt.push_str("\n\n角色设定：");
        prompt.push_str(extra);
    }
    prompt
}
