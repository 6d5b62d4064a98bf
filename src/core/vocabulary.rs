use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::template::{Template, TemplateError};

const BUILTIN_RON: &str = include_str!("../../data/scene_vocabulary.ron");

/// Slots a narrative template may reference.
pub const SLOTS: [&str; 9] = [
    "location",
    "weather",
    "atmosphere",
    "objects",
    "landscape",
    "time_of_day",
    "season",
    "sounds",
    "smells",
];

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("template references unknown slot '{0}'")]
    UnknownSlot(String),
    #[error("vocabulary axis '{0}' is empty")]
    EmptyAxis(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Word tables and prose skeletons for scene narratives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneVocabulary {
    pub indoor: Vec<String>,
    pub outdoor: Vec<String>,
    pub weather: Vec<String>,
    pub atmosphere: Vec<String>,
    pub objects: Vec<String>,
    pub landscapes: Vec<String>,
    pub time_of_day: Vec<String>,
    pub season: Vec<String>,
    pub sounds: Vec<String>,
    pub smells: Vec<String>,
    pub templates: Vec<Template>,
    /// Filler paragraphs appended after the filled template.
    pub extensions: Vec<String>,
}

// Templates arrive as plain strings and are parsed after deserialization.
#[derive(Debug, Deserialize)]
struct RonVocabulary {
    #[serde(default)]
    indoor: Vec<String>,
    #[serde(default)]
    outdoor: Vec<String>,
    #[serde(default)]
    weather: Vec<String>,
    #[serde(default)]
    atmosphere: Vec<String>,
    #[serde(default)]
    objects: Vec<String>,
    #[serde(default)]
    landscapes: Vec<String>,
    #[serde(default)]
    time_of_day: Vec<String>,
    #[serde(default)]
    season: Vec<String>,
    #[serde(default)]
    sounds: Vec<String>,
    #[serde(default)]
    smells: Vec<String>,
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    extensions: Vec<String>,
}

impl SceneVocabulary {
    /// The vocabulary shipped with the crate.
    pub fn builtin() -> Result<SceneVocabulary, VocabularyError> {
        Self::parse_ron(BUILTIN_RON)
    }

    /// Load a vocabulary from a RON file. Missing axes are left empty.
    pub fn load_from_ron(path: &Path) -> Result<SceneVocabulary, VocabularyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a vocabulary from a RON string. Missing axes are left empty.
    pub fn parse_ron(input: &str) -> Result<SceneVocabulary, VocabularyError> {
        let raw: RonVocabulary = ron::from_str(input)?;

        let mut templates = Vec::with_capacity(raw.templates.len());
        for text in &raw.templates {
            let template = Template::parse(text)?;
            if let Some(slot) = template.slots().find(|s| !SLOTS.contains(s)) {
                return Err(VocabularyError::UnknownSlot(slot.to_string()));
            }
            templates.push(template);
        }

        Ok(SceneVocabulary {
            indoor: raw.indoor,
            outdoor: raw.outdoor,
            weather: raw.weather,
            atmosphere: raw.atmosphere,
            objects: raw.objects,
            landscapes: raw.landscapes,
            time_of_day: raw.time_of_day,
            season: raw.season,
            sounds: raw.sounds,
            smells: raw.smells,
            templates,
            extensions: raw.extensions,
        })
    }

    /// Append the entries of `other` to each axis, skipping ones already present.
    pub fn merge(&mut self, other: SceneVocabulary) {
        fn extend<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
            for item in from {
                if !into.contains(&item) {
                    into.push(item);
                }
            }
        }
        extend(&mut self.indoor, other.indoor);
        extend(&mut self.outdoor, other.outdoor);
        extend(&mut self.weather, other.weather);
        extend(&mut self.atmosphere, other.atmosphere);
        extend(&mut self.objects, other.objects);
        extend(&mut self.landscapes, other.landscapes);
        extend(&mut self.time_of_day, other.time_of_day);
        extend(&mut self.season, other.season);
        extend(&mut self.sounds, other.sounds);
        extend(&mut self.smells, other.smells);
        extend(&mut self.templates, other.templates);
        extend(&mut self.extensions, other.extensions);
    }

    /// Every axis must have at least one entry before generation.
    pub fn validate(&self) -> Result<(), VocabularyError> {
        let axes: [(&'static str, usize); 12] = [
            ("indoor", self.indoor.len()),
            ("outdoor", self.outdoor.len()),
            ("weather", self.weather.len()),
            ("atmosphere", self.atmosphere.len()),
            ("objects", self.objects.len()),
            ("landscapes", self.landscapes.len()),
            ("time_of_day", self.time_of_day.len()),
            ("season", self.season.len()),
            ("sounds", self.sounds.len()),
            ("smells", self.smells.len()),
            ("templates", self.templates.len()),
            ("extensions", self.extensions.len()),
        ];
        match axes.iter().find(|(_, len)| *len == 0) {
            Some((name, _)) => Err(VocabularyError::EmptyAxis(name)),
            None => Ok(()),
        }
    }
}
