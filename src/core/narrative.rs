//! Scene narratives: long-form descriptions filled from the scene vocabulary,
//! deduplicated into a persisted library.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::similarity::is_similar;
use super::template::Bindings;
use super::vocabulary::{SceneVocabulary, VocabularyError};
use crate::llm::provider::ProviderKind;
use crate::llm::LanguageModel;
use crate::schema::npc::Persona;
use crate::store::storage::Storage;

pub const MIN_DESCRIPTION_CHARS: usize = 300;
/// Two descriptions above this similarity are duplicates.
pub const DEDUP_THRESHOLD: f64 = 0.7;
pub const PLOT_LIBRARY_KEY: &str = "plotDescriptions";
pub const DEFAULT_LIBRARY_SIZE: usize = 100;

// Rejected candidates allowed per requested entry before the batch gives up.
const ATTEMPTS_PER_ENTRY: usize = 20;

pub struct NarrativeGenerator {
    vocabulary: SceneVocabulary,
}

impl NarrativeGenerator {
    pub fn new(vocabulary: SceneVocabulary) -> Result<Self, VocabularyError> {
        vocabulary.validate()?;
        Ok(Self { vocabulary })
    }

    pub fn builtin() -> Result<Self, VocabularyError> {
        Self::new(SceneVocabulary::builtin()?)
    }

    pub fn vocabulary(&self) -> &SceneVocabulary {
        &self.vocabulary
    }

    /// One description of at least `MIN_DESCRIPTION_CHARS` characters.
    pub fn generate(&self, rng: &mut StdRng) -> String {
        let v = &self.vocabulary;
        let locations = if rng.gen_bool(0.5) { &v.indoor } else { &v.outdoor };
        let objects: Vec<&str> = v.objects.choose_multiple(rng, 3).map(String::as_str).collect();

        let mut bindings = Bindings::new();
        bindings
            .set("location", pick(locations, rng))
            .set("weather", pick(&v.weather, rng))
            .set("atmosphere", pick(&v.atmosphere, rng))
            .set("objects", objects.join("、"))
            .set("landscape", pick(&v.landscapes, rng))
            .set("time_of_day", pick(&v.time_of_day, rng))
            .set("season", pick(&v.season, rng))
            .set("sounds", pick(&v.sounds, rng))
            .set("smells", pick(&v.smells, rng));

        let mut text = match v.templates.choose(rng).map(|t| t.render(&bindings)) {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                log::warn!("narrative template failed: {}", e);
                String::new()
            }
            None => String::new(),
        };

        let extension_count = rng.gen_range(3..=4);
        for _ in 0..extension_count {
            append_extension(&mut text, &v.extensions, rng);
        }
        // Guard against short custom extension tables.
        let mut guard = 0;
        while text.chars().count() < MIN_DESCRIPTION_CHARS && guard < 64 {
            append_extension(&mut text, &v.extensions, rng);
            guard += 1;
        }
        text
    }

    /// Up to `count` descriptions, no two more similar than `DEDUP_THRESHOLD`.
    ///
    /// Candidates too close to an accepted entry are discarded and regenerated.
    /// Gives up after a bounded number of rejections and returns what it has.
    pub fn generate_library(&self, count: usize, rng: &mut StdRng) -> Vec<String> {
        let mut accepted: Vec<String> = Vec::with_capacity(count);
        let max_attempts = count.saturating_mul(ATTEMPTS_PER_ENTRY);
        let mut attempts = 0;

        while accepted.len() < count && attempts < max_attempts {
            attempts += 1;
            let candidate = self.generate(rng);
            if candidate.chars().count() < MIN_DESCRIPTION_CHARS {
                continue;
            }
            if accepted.iter().any(|d| is_similar(d, &candidate, DEDUP_THRESHOLD)) {
                continue;
            }
            accepted.push(candidate);
        }

        if accepted.len() < count {
            log::warn!(
                "narrative library: accepted {} of {} after {} attempts",
                accepted.len(),
                count,
                attempts
            );
        }
        accepted
    }
}

fn pick<'a>(items: &'a [String], rng: &mut StdRng) -> &'a str {
    items.choose(rng).map(String::as_str).unwrap_or_default()
}

fn append_extension(text: &mut String, extensions: &[String], rng: &mut StdRng) {
    if let Some(ext) = extensions.choose(rng) {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(ext);
    }
}

/// Cached library of descriptions, persisted under `PLOT_LIBRARY_KEY`.
pub struct PlotLibrary {
    generator: NarrativeGenerator,
    storage: Arc<dyn Storage + Send + Sync>,
    size: usize,
}

impl PlotLibrary {
    pub fn new(generator: NarrativeGenerator, storage: Arc<dyn Storage + Send + Sync>) -> Self {
        Self {
            generator,
            storage,
            size: DEFAULT_LIBRARY_SIZE,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The cached library, generating and storing a fresh one if none is readable.
    pub fn stored(&self, rng: &mut StdRng) -> Vec<String> {
        match self.storage.read(PLOT_LIBRARY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) if !list.is_empty() => return list,
                Ok(_) => log::warn!("narrative library is empty, regenerating"),
                Err(e) => log::error!("narrative library is unreadable ({}), regenerating", e),
            },
            Ok(None) => {}
            Err(e) => log::error!("narrative library read failed: {}", e),
        }
        self.refresh(rng)
    }

    /// Regenerate the library and persist it.
    pub fn refresh(&self, rng: &mut StdRng) -> Vec<String> {
        let library = self.generator.generate_library(self.size, rng);
        match serde_json::to_string(&library) {
            Ok(json) => {
                if let Err(e) = self.storage.write(PLOT_LIBRARY_KEY, &json) {
                    log::error!("narrative library write failed: {}", e);
                } else {
                    log::info!("stored {} narrative descriptions", library.len());
                }
            }
            Err(e) => log::error!("narrative library encode failed: {}", e),
        }
        library
    }

    /// A stored description of acceptable length. A short or missing pick
    /// regenerates the whole library once.
    pub fn random_description(&self, rng: &mut StdRng) -> String {
        let library = self.stored(rng);
        if let Some(desc) = library.choose(rng).filter(|d| long_enough(d)) {
            return desc.clone();
        }

        log::warn!("stored narrative below {} chars, regenerating library", MIN_DESCRIPTION_CHARS);
        let library = self.refresh(rng);
        match library.choose(rng).filter(|d| long_enough(d)) {
            Some(desc) => desc.clone(),
            None => self.generator.generate(rng),
        }
    }

    /// A random description, stylistically expanded by the language model when possible.
    pub async fn random_description_enhanced(&self, llm: &LanguageModel, rng: &mut StdRng) -> String {
        let local = self.random_description(rng);
        enhance(llm, &local).await
    }
}

fn long_enough(text: &str) -> bool {
    text.chars().count() >= MIN_DESCRIPTION_CHARS
}

/// Ask the model to expand `description`; keep the original on failure or a short reply.
pub async fn enhance(llm: &LanguageModel, description: &str) -> String {
    let persona = Persona::new("剧情增强AI", "游戏场景设计师", "创意", "详细");
    let prompt = format!(
        "请将以下剧情描述扩展为一段更丰富、更生动的场景描写，保持原有核心元素但增加更多细节和感官描写，确保长度至少300字：\n\n{}",
        description
    );

    match llm
        .try_converse(&persona, &prompt, Some(ProviderKind::DoubaoThinkingPro))
        .await
    {
        Ok(text) if long_enough(&text) => text,
        Ok(text) => {
            log::debug!(
                "enhanced narrative too short ({} chars), keeping local text",
                text.chars().count()
            );
            description.to_string()
        }
        Err(e) => {
            log::warn!("narrative enhancement failed: {}", e);
            description.to_string()
        }
    }
}
