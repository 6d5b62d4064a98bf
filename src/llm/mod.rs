//! Language-model façade.
//!
//! A persona and a message go in; text comes out. The façade picks a backend
//! (explicit hint, then the persona's speech pattern, then its personality,
//! then the configured default), builds the in-character system prompt and
//! substitutes a role-keyed canned line when the backend fails.

pub mod error;
pub mod fallback;
pub mod prompt;
pub mod provider;

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::config::{ConfigError, EngineConfig};
use crate::schema::npc::Persona;

use error::ProviderError;
use provider::{ChatCompletionsProvider, ChatRequest, OfflineProvider, ProviderKind, TextGenerationProvider};

/// Trait value (speech pattern or personality) to the backend that suits it.
pub fn preferred_provider(trait_value: &str) -> Option<ProviderKind> {
    match trait_value.trim() {
        "幽默" | "口语化" => Some(ProviderKind::Doubao),
        "严肃" | "冗长" | "正式" => Some(ProviderKind::DeepSeek),
        "简洁" => Some(ProviderKind::Coze),
        "详细" => Some(ProviderKind::VolcanoDoubao),
        _ => None,
    }
}

pub struct LanguageModel {
    providers: FxHashMap<ProviderKind, Arc<dyn TextGenerationProvider>>,
    default_provider: ProviderKind,
    rng: Mutex<StdRng>,
}

impl LanguageModel {
    /// A façade with no backends. Every call falls back until one is registered.
    pub fn new(default_provider: ProviderKind, seed: u64) -> Self {
        Self {
            providers: FxHashMap::default(),
            default_provider,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Every provider served locally.
    pub fn offline(seed: u64) -> Self {
        let mut llm = Self::new(ProviderKind::Coze, seed);
        for (i, kind) in ProviderKind::ALL.into_iter().enumerate() {
            llm.register(Arc::new(OfflineProvider::new(kind, seed.wrapping_add(i as u64 + 1))));
        }
        llm
    }

    /// Remote providers where a credential resolves, offline ones elsewhere.
    pub fn from_config(config: &EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        let mut llm = Self::new(config.default_provider, seed);

        for (i, kind) in ProviderKind::ALL.into_iter().enumerate() {
            let profile = config.profile(kind);
            match profile.resolve_api_key() {
                Some(key) => {
                    log::info!("{}: remote provider at {}", kind, profile.url);
                    llm.register(Arc::new(ChatCompletionsProvider::new(
                        profile,
                        key,
                        client.clone(),
                        config.request_timeout(),
                    )));
                }
                None => {
                    log::info!("{}: no credential configured, replies are generated locally", kind);
                    llm.register(Arc::new(OfflineProvider::new(kind, seed.wrapping_add(i as u64 + 1))));
                }
            }
        }
        Ok(llm)
    }

    /// Install `provider` for its kind, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn TextGenerationProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    pub fn select_provider(&self, persona: &Persona, hint: Option<ProviderKind>) -> ProviderKind {
        hint.or_else(|| preferred_provider(&persona.speech_pattern))
            .or_else(|| preferred_provider(&persona.personality))
            .unwrap_or(self.default_provider)
    }

    /// One attempt against the selected backend. No retries.
    pub async fn try_converse(
        &self,
        persona: &Persona,
        message: &str,
        hint: Option<ProviderKind>,
    ) -> Result<String, ProviderError> {
        let kind = self.select_provider(persona, hint);
        let provider = self
            .providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProviderError::Transport(format!("no provider registered for {}", kind)))?;

        let request = ChatRequest {
            persona: persona.clone(),
            system_prompt: prompt::system_prompt(persona),
            message: message.to_string(),
        };
        let reply = provider.converse(&request).await?;
        if reply.trim().is_empty() {
            return Err(ProviderError::MalformedResponse(format!("{} returned an empty reply", kind)));
        }
        log::debug!("{} replied for {}", kind, persona.name);
        Ok(reply)
    }

    /// Always returns a non-empty line; failures become a canned reply.
    pub async fn converse(&self, persona: &Persona, message: &str, hint: Option<ProviderKind>) -> String {
        match self.try_converse(persona, message, hint).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!(
                    "{} call failed for {} ({:?}): {}",
                    self.select_provider(persona, hint),
                    persona.name,
                    e.kind(),
                    e
                );
                self.fallback(persona)
            }
        }
    }

    /// A canned line for `persona`.
    pub fn fallback(&self, persona: &Persona) -> String {
        match self.rng.lock() {
            Ok(mut rng) => fallback::fallback_reply(persona, &mut rng),
            Err(poisoned) => fallback::fallback_reply(persona, &mut poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;

    struct Failing(ProviderKind);

    impl TextGenerationProvider for Failing {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        fn converse<'a>(&'a self, _: &'a ChatRequest) -> BoxFuture<'a, Result<String, ProviderError>> {
            Box::pin(async { Err(ProviderError::RateLimited) })
        }
    }

    struct Echo(ProviderKind);

    impl TextGenerationProvider for Echo {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        fn converse<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<String, ProviderError>> {
            Box::pin(async move { Ok(format!("{}:{}", self.0, request.message)) })
        }
    }

    #[test]
    fn selection_order() {
        let llm = LanguageModel::new(ProviderKind::Coze, 0);
        let mut persona = Persona::new("甲", "商人", "严肃", "幽默");
        assert_eq!(llm.select_provider(&persona, Some(ProviderKind::VolcanoDoubao)), ProviderKind::VolcanoDoubao);
        assert_eq!(llm.select_provider(&persona, None), ProviderKind::Doubao);
        persona.speech_pattern = "标准".to_string();
        assert_eq!(llm.select_provider(&persona, None), ProviderKind::DeepSeek);
        persona.personality = "中立".to_string();
        assert_eq!(llm.select_provider(&persona, None), ProviderKind::Coze);
        persona.speech_pattern = "详细".to_string();
        assert_eq!(llm.select_provider(&persona, None), ProviderKind::VolcanoDoubao);
    }

    #[tokio::test]
    async fn unregistered_provider_is_transport_error() {
        let llm = LanguageModel::new(ProviderKind::DeepSeek, 0);
        let persona = Persona::new("甲", "商人", "中立", "标准");
        let err = llm.try_converse(&persona, "hi", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        let reply = llm.converse(&persona, "hi", None).await;
        assert!(fallback::lines_for_role("商人").contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn failure_falls_back_to_role_table() {
        let mut llm = LanguageModel::new(ProviderKind::Coze, 5);
        llm.register(Arc::new(Failing(ProviderKind::Coze)));
        let persona = Persona::new("老周", "酒馆老板", "友好", "标准");
        let reply = llm.converse(&persona, "来杯酒", None).await;
        assert!(fallback::lines_for_role("酒馆老板").contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn hint_routes_to_registered_backend() {
        let mut llm = LanguageModel::new(ProviderKind::Coze, 5);
        llm.register(Arc::new(Echo(ProviderKind::DeepSeek)));
        let persona = Persona::new("老周", "酒馆老板", "友好", "标准");
        let reply = llm.converse(&persona, "问路", Some(ProviderKind::DeepSeek)).await;
        assert_eq!(reply, "deepseek:问路");
    }

    #[tokio::test]
    async fn offline_facade_never_empty() {
        let llm = LanguageModel::offline(9);
        for kind in ProviderKind::ALL {
            let persona = Persona::new("路人", "未知角色", "敌对", "标准");
            let reply = llm.try_converse(&persona, "你是谁", Some(kind)).await.unwrap();
            assert!(!reply.trim().is_empty());
        }
    }
}
