//! Image-generation façade.
//!
//! `generate_image` always yields a renderable URL: the backend's first result,
//! or a placeholder-service URL derived from the prompt.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::config::{ConfigError, EngineConfig, ImageProfile};
use crate::llm::error::ProviderError;
use crate::transport::{extract_str, post_json, JsonPost, PathStep};

/// Aspect label understood by the placeholder service.
pub const SQUARE: &str = "square";
pub const LANDSCAPE: &str = "landscape_16_9";

/// A backend that turns a prompt (and optional reference images) into an image URL.
pub trait ImageProvider: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        references: &'a [String],
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

const URL_PATH: [PathStep; 3] = [PathStep::Key("data"), PathStep::Index(0), PathStep::Key("url")];

/// The Seedream `images/generate` endpoint.
pub struct SeedreamProvider {
    profile: ImageProfile,
    api_key: String,
    client: reqwest::Client,
    deadline: Duration,
}

impl SeedreamProvider {
    pub fn new(profile: ImageProfile, api_key: impl Into<String>, client: reqwest::Client, deadline: Duration) -> Self {
        Self {
            profile,
            api_key: api_key.into(),
            client,
            deadline,
        }
    }

    pub fn request_body(&self, prompt: &str, references: &[String]) -> Value {
        json!({
            "model": self.profile.model,
            "prompt": prompt,
            "image": references,
            "size": self.profile.size,
            "sequential_image_generation": "auto",
            "sequential_image_generation_options": { "max_images": 1 },
            "response_format": "url",
            "watermark": self.profile.watermark,
        })
    }
}

impl ImageProvider for SeedreamProvider {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        references: &'a [String],
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let body = self.request_body(prompt, references);
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

            extract_str(&value, &URL_PATH)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::MalformedResponse("missing data[0].url".to_string()))
        })
    }
}

pub struct ImageFacade {
    provider: Option<Arc<dyn ImageProvider>>,
    placeholder_base: String,
}

impl ImageFacade {
    pub fn new(provider: Option<Arc<dyn ImageProvider>>, placeholder_base: impl Into<String>) -> Self {
        Self {
            provider,
            placeholder_base: placeholder_base.into(),
        }
    }

    /// No backend; every image is a placeholder.
    pub fn offline(placeholder_base: impl Into<String>) -> Self {
        Self::new(None, placeholder_base)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let provider: Option<Arc<dyn ImageProvider>> = match config.image.resolve_api_key() {
            Some(key) => Some(Arc::new(SeedreamProvider::new(
                config.image.clone(),
                key,
                config.http_client()?,
                config.request_timeout(),
            ))),
            None => {
                log::info!("image: no credential configured, using placeholders");
                None
            }
        };
        Ok(Self::new(provider, config.placeholder_base.clone()))
    }

    pub fn placeholder_base(&self) -> &str {
        &self.placeholder_base
    }

    pub async fn try_generate_image(&self, prompt: &str, references: &[String]) -> Result<String, ProviderError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ProviderError::Transport("no image provider configured".to_string()))?;
        let url = provider.generate(prompt, references).await?;
        log::debug!("image generated for prompt of {} chars", prompt.chars().count());
        Ok(url)
    }

    /// Always returns a URL; failures become a placeholder.
    pub async fn generate_image(&self, prompt: &str, references: &[String]) -> String {
        match self.try_generate_image(prompt, references).await {
            Ok(url) => url,
            Err(e) => {
                if self.provider.is_some() {
                    log::warn!("image generation failed ({:?}): {}", e.kind(), e);
                }
                self.placeholder(prompt, "fallback")
            }
        }
    }

    /// Square placeholder with a `<prefix>_<millis>` cache-busting token.
    pub fn placeholder(&self, prompt: &str, sign_prefix: &str) -> String {
        let sign = format!("{}_{}", sign_prefix, chrono::Utc::now().timestamp_millis());
        placeholder_url(&self.placeholder_base, SQUARE, prompt, &sign)
    }
}

/// Placeholder-service URL for `prompt`.
pub fn placeholder_url(base: &str, image_size: &str, prompt: &str, sign: &str) -> String {
    format!(
        "{}?image_size={}&prompt={}&sign={}",
        base,
        image_size,
        urlencoding::encode(prompt),
        urlencoding::encode(sign)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLACEHOLDER_BASE;

    #[test]
    fn placeholder_encodes_prompt() {
        let url = placeholder_url("https://img.test/gen", SQUARE, "古老 书籍, icon", "fallback_1");
        assert_eq!(
            url,
            "https://img.test/gen?image_size=square&prompt=%E5%8F%A4%E8%80%81%20%E4%B9%A6%E7%B1%8D%2C%20icon&sign=fallback_1"
        );
    }

    #[test]
    fn seedream_body_shape() {
        let provider = SeedreamProvider::new(
            ImageProfile::default(),
            "k",
            reqwest::Client::new(),
            Duration::from_secs(1),
        );
        let body = provider.request_body("a cat", &["https://ref/1.png".to_string()]);
        assert_eq!(body["model"], "doubao-seedream-4-0");
        assert_eq!(body["image"][0], "https://ref/1.png");
        assert_eq!(body["size"], "2K");
        assert_eq!(body["sequential_image_generation_options"]["max_images"], 1);
        assert_eq!(body["response_format"], "url");
        assert_eq!(body["watermark"], true);
    }

    #[tokio::test]
    async fn offline_facade_returns_placeholder() {
        let images = ImageFacade::offline(DEFAULT_PLACEHOLDER_BASE);
        assert!(images.try_generate_image("x", &[]).await.is_err());
        let url = images.generate_image("game prop, 钥匙", &[]).await;
        assert!(url.starts_with(DEFAULT_PLACEHOLDER_BASE));
        assert!(url.contains("prompt=game%20prop%2C%20"));
        assert!(url.contains("&sign=fallback_"));
    }
}
