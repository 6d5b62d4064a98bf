/// Endpoint, credential and timeout configuration for the remote façades.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::llm::provider::ProviderKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_PLACEHOLDER_BASE: &str = "https://space.coze.cn/api/coze_space/gen_image";

/// Sampling parameters sent by providers that accept them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 0.9,
        }
    }
}

/// How to reach one text-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub url: String,
    pub model: String,
    /// Explicit key; takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is absent.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub sampling: Option<Sampling>,
    /// Send `"stream": false` explicitly.
    #[serde(default)]
    pub stream_flag: bool,
}

impl ProviderProfile {
    /// The credential, if one is configured directly or through the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }

    /// Built-in profile for a provider. Credentials come from the environment.
    pub fn builtin(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Coze => Self {
                kind,
                url: "https://api.coze.cn/open_api/v2/chat/completions".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                api_key: None,
                api_key_env: Some("COZE_API_KEY".to_string()),
                headers: Vec::new(),
                sampling: None,
                stream_flag: false,
            },
            ProviderKind::DeepSeek => Self {
                kind,
                url: "https://api.deepseek.com/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                api_key: None,
                api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
                headers: Vec::new(),
                sampling: Some(Sampling::default()),
                stream_flag: false,
            },
            ProviderKind::Doubao => Self {
                kind,
                url: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
                model: "doubao-pro-32k".to_string(),
                api_key: None,
                api_key_env: Some("DOUBAO_API_KEY".to_string()),
                headers: Vec::new(),
                sampling: Some(Sampling::default()),
                stream_flag: false,
            },
            ProviderKind::DoubaoThinkingPro => Self {
                kind,
                url: "https://api.doubao.com/chat/completions".to_string(),
                model: "doubao-1.5-thinking-pro".to_string(),
                api_key: None,
                api_key_env: Some("DOUBAO_API_KEY".to_string()),
                headers: Vec::new(),
                sampling: Some(Sampling::default()),
                stream_flag: true,
            },
            ProviderKind::VolcanoDoubao => Self {
                kind,
                url: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
                model: "doubao-seed-1-6-thinking".to_string(),
                api_key: None,
                api_key_env: Some("ARK_API_KEY".to_string()),
                headers: vec![("x-is-encrypted".to_string(), "true".to_string())],
                sampling: Some(Sampling::default()),
                stream_flag: false,
            },
        }
    }
}

/// How to reach the image-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProfile {
    pub url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Output size label understood by the backend.
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_true")]
    pub watermark: bool,
}

fn default_image_size() -> String {
    "2K".to_string()
}

fn default_true() -> bool {
    true
}

impl ImageProfile {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }
}

impl Default for ImageProfile {
    fn default() -> Self {
        Self {
            url: "https://ark.cn-beijing.volces.com/api/v3/images/generate".to_string(),
            model: "doubao-seedream-4-0".to_string(),
            api_key: None,
            api_key_env: Some("ARK_API_KEY".to_string()),
            headers: vec![("x-is-encrypted".to_string(), "true".to_string())],
            size: default_image_size(),
            watermark: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
    /// Profiles override the built-in profile of the same kind.
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
    #[serde(default)]
    pub image: ImageProfile,
    #[serde(default = "default_placeholder_base")]
    pub placeholder_base: String,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_provider() -> ProviderKind {
    ProviderKind::Coze
}

fn default_placeholder_base() -> String {
    DEFAULT_PLACEHOLDER_BASE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_provider: default_provider(),
            providers: Vec::new(),
            image: ImageProfile::default(),
            placeholder_base: default_placeholder_base(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The effective profile for `kind`: a configured one if present, else built-in.
    pub fn profile(&self, kind: ProviderKind) -> ProviderProfile {
        self.providers
            .iter()
            .rev()
            .find(|p| p.kind == kind)
            .cloned()
            .unwrap_or_else(|| ProviderProfile::builtin(kind))
    }

    /// One shared HTTP client, bounded by the request timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?)
    }
}

fn resolve_key(explicit: Option<&str>, env: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| env.and_then(|name| std::env::var(name).ok()))
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.default_provider, ProviderKind::Coze);
        assert_eq!(cfg.profile(ProviderKind::Coze).model, "gpt-3.5-turbo");
        assert!(cfg
            .profile(ProviderKind::VolcanoDoubao)
            .headers
            .contains(&("x-is-encrypted".to_string(), "true".to_string())));
        assert!(cfg.profile(ProviderKind::DoubaoThinkingPro).stream_flag);
    }

    #[test]
    fn parse_ron_overrides_profile() {
        let cfg = EngineConfig::parse_ron(
            r#"(
                request_timeout_ms: 500,
                default_provider: deepseek,
                providers: [
                    (
                        kind: deepseek,
                        url: "http://127.0.0.1:9/chat",
                        model: "test-model",
                        api_key: Some("secret"),
                    ),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(cfg.request_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.default_provider, ProviderKind::DeepSeek);
        let p = cfg.profile(ProviderKind::DeepSeek);
        assert_eq!(p.model, "test-model");
        assert_eq!(p.resolve_api_key().as_deref(), Some("secret"));
        assert!(p.sampling.is_none());
        assert_eq!(cfg.placeholder_base, DEFAULT_PLACEHOLDER_BASE);
    }

    #[test]
    fn blank_key_is_no_key() {
        let mut p = ProviderProfile::builtin(ProviderKind::Coze);
        p.api_key = Some("  ".to_string());
        p.api_key_env = None;
        assert_eq!(p.resolve_api_key(), None);
    }

    #[test]
    fn invalid_ron_is_an_error() {
        assert!(matches!(
            EngineConfig::parse_ron("(request_timeout_ms: \"soon\")"),
            Err(ConfigError::Ron(_))
        ));
    }
}
