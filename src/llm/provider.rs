use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ProviderProfile;
use crate::core::template::{fill, Bindings};
use crate::schema::npc::{Persona, DEFAULT_PERSONALITY};
use crate::transport::{extract_str, post_json, JsonPost, PathStep};

use super::error::ProviderError;

/// Named text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "coze")]
    Coze,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "doubao")]
    Doubao,
    #[serde(rename = "doubao-1.5-thinking-pro")]
    DoubaoThinkingPro,
    #[serde(rename = "volcano-doubao")]
    VolcanoDoubao,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Coze,
        ProviderKind::DeepSeek,
        ProviderKind::Doubao,
        ProviderKind::DoubaoThinkingPro,
        ProviderKind::VolcanoDoubao,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Coze => "coze",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Doubao => "doubao",
            ProviderKind::DoubaoThinkingPro => "doubao-1.5-thinking-pro",
            ProviderKind::VolcanoDoubao => "volcano-doubao",
        }
    }

    pub fn parse(name: &str) -> Option<ProviderKind> {
        Self::ALL.into_iter().find(|k| k.name() == name.trim())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One system+user exchange for a persona.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub persona: Persona,
    pub system_prompt: String,
    pub message: String,
}

/// A backend that turns a chat request into a reply.
pub trait TextGenerationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn converse<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String, ProviderError>>;
}

const CONTENT_PATH: [PathStep; 4] = [
    PathStep::Key("choices"),
    PathStep::Index(0),
    PathStep::Key("message"),
    PathStep::Key("content"),
];

/// OpenAI-style `chat/completions` endpoint with bearer authentication.
pub struct ChatCompletionsProvider {
    profile: ProviderProfile,
    api_key: String,
    client: reqwest::Client,
    deadline: Duration,
}

impl ChatCompletionsProvider {
    pub fn new(
        profile: ProviderProfile,
        api_key: impl Into<String>,
        client: reqwest::Client,
        deadline: Duration,
    ) -> Self {
        Self {
            profile,
            api_key: api_key.into(),
            client,
            deadline,
        }
    }

    pub fn request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.profile.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.message },
            ],
        });
        if let Some(sampling) = &self.profile.sampling {
            body["temperature"] = json!(sampling.temperature);
            body["max_tokens"] = json!(sampling.max_tokens);
            body["top_p"] = json!(sampling.top_p);
        }
        if self.profile.stream_flag {
            body["stream"] = json!(false);
        }
        body
    }
}

impl TextGenerationProvider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.profile.kind
    }

    fn converse<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let body = self.request_body(request);
            log::debug!(
                "{}: system prompt {} chars, message {} chars",
                self.profile.kind,
                request.system_prompt.chars().count(),
                request.message.chars().count()
            );
            let value = post_json(
                &self.client,
                JsonPost {
                    url: &self.profile.url,
                    api_key: &self.api_key,
                    headers: &self.profile.headers,
                    body: &body,
                },
                self.deadline,
            )
            .await?;

            extract_str(&value, &CONTENT_PATH)
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
                })
        })
    }
}

/// Locally generated, model-flavoured replies. Used when no credential is configured.
pub struct OfflineProvider {
    kind: ProviderKind,
    rng: Mutex<StdRng>,
}

impl OfflineProvider {
    pub fn new(kind: ProviderKind, seed: u64) -> Self {
        Self {
            kind,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick a reply for `persona` in this provider's register.
    pub fn reply(&self, persona: &Persona) -> String {
        let table = offline_lines(self.kind, &persona.personality)
            .or_else(|| offline_lines(self.kind, DEFAULT_PERSONALITY))
            .unwrap_or(&[]);

        let line = match self.rng.lock() {
            Ok(mut rng) => table.choose(&mut *rng).copied(),
            Err(poisoned) => table.choose(&mut *poisoned.into_inner()).copied(),
        };
        let bindings = Bindings::new()
            .with("name", persona.name.as_str())
            .with("role", persona.role.as_str());
        fill(line.unwrap_or("{name}：有什么可以帮你的吗？"), &bindings)
    }
}

impl TextGenerationProvider for OfflineProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn converse<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String, ProviderError>> {
        let reply = self.reply(&request.persona);
        Box::pin(async move { Ok(reply) })
    }
}

fn offline_lines(kind: ProviderKind, personality: &str) -> Option<&'static [&'static str]> {
    let lines: &'static [&'static str] = match (kind, personality) {
        (ProviderKind::Coze, "中立") => &[
            "{name}：有什么可以帮你的吗？",
            "我能为你提供些什么帮助？",
            "需要了解什么信息吗？",
        ],
        (ProviderKind::Coze, "友好") => &[
            "你好啊！我是{name}，很高兴见到你！",
            "嗨！有什么我能帮忙的吗？",
            "欢迎来到这里！我能为你做些什么？",
        ],
        (ProviderKind::Coze, "敌对") => &[
            "你想干什么？离我远点！",
            "我警告你，别靠近我！",
            "这里不欢迎你，快离开！",
        ],
        (ProviderKind::DeepSeek, "中立") => &[
            "{name}：我是这里的{role}。有什么问题请尽管问。",
            "作为{role}，我可以回答你的问题。",
            "我负责这个区域，你需要什么帮助？",
        ],
        (ProviderKind::DeepSeek, "友好") => &[
            "欢迎来到我们这里！我是{name}，有什么可以为你效劳的吗？",
            "你好，旅行者！我是本地的{role}，很高兴能帮助你。",
            "见到你真高兴！如果你需要了解这个地方的任何信息，都可以问我。",
        ],
        (ProviderKind::DeepSeek, "敌对") => &[
            "陌生人，我必须警告你，这里不欢迎外来者。",
            "你的出现让我很警惕，说明你的来意。",
            "我不喜欢陌生人在这附近徘徊，你有什么目的？",
        ],
        (_, "中立") => &[
            "{name}：哟，来啦？找我有事吗？",
            "嘿！需要帮忙不？",
            "路过啊？有啥想问的不？",
        ],
        (_, "友好") => &[
            "哎呀，稀客稀客！我是{name}，很高兴见到你！",
            "哈喽哈喽！终于有人来陪我说话了！",
            "你好呀！我等你好久啦，有什么想知道的？",
        ],
        (_, "敌对") => &[
            "喂！你谁啊？干嘛闯进来！",
            "嘿！站住！这里可不是你该来的地方！",
            "哪来的家伙？赶紧滚出去，不然我不客气了！",
        ],
        _ => return None,
    };
    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(personality: &str) -> ChatRequest {
        ChatRequest {
            persona: Persona::new("老王", "商人", personality, "标准"),
            system_prompt: "system".to_string(),
            message: "你好".to_string(),
        }
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(ProviderKind::parse("gpt"), None);
        assert_eq!(
            serde_json::to_string(&ProviderKind::DoubaoThinkingPro).unwrap(),
            "\"doubao-1.5-thinking-pro\""
        );
    }

    #[test]
    fn body_carries_sampling_and_stream_flag() {
        let profile = ProviderProfile::builtin(ProviderKind::DoubaoThinkingPro);
        let provider =
            ChatCompletionsProvider::new(profile, "k", reqwest::Client::new(), Duration::from_secs(1));
        let body = provider.request_body(&request("中立"));
        assert_eq!(body["model"], "doubao-1.5-thinking-pro");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "你好");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn coze_body_is_minimal() {
        let profile = ProviderProfile::builtin(ProviderKind::Coze);
        let provider =
            ChatCompletionsProvider::new(profile, "k", reqwest::Client::new(), Duration::from_secs(1));
        let body = provider.request_body(&request("中立"));
        assert!(body.get("temperature").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn offline_reply_interpolates_persona() {
        let provider = OfflineProvider::new(ProviderKind::DeepSeek, 3);
        for _ in 0..20 {
            let reply = provider.reply(&request("中立").persona);
            assert!(!reply.is_empty());
            assert!(!reply.contains('{'));
        }
    }

    #[test]
    fn offline_unknown_personality_uses_neutral() {
        let provider = OfflineProvider::new(ProviderKind::Coze, 1);
        let reply = provider.reply(&request("古怪").persona);
        let neutral = offline_lines(ProviderKind::Coze, "中立").unwrap();
        let rendered: Vec<String> = neutral.iter().map(|l| l.replace("{name}", "老王")).collect();
        assert!(rendered.contains(&reply));
    }
}
