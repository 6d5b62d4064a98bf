/// Slot templates: parsing and rendering of `{slot}` prose skeletons.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
    #[error("no value bound for slot '{0}'")]
    UnboundSlot(String),
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A named slot: `{location}`.
    Slot(String),
}

/// A parsed template: a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

/// Values available to a template render, keyed by slot name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: FxHashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(slot.to_string(), value.into());
        self
    }

    pub fn with(mut self, slot: &str, value: impl Into<String>) -> Self {
        self.set(slot, value);
        self
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.values.get(slot).map(String::as_str)
    }
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{slot_name}` → `Slot`
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                let mut closed = false;
                while end < len {
                    if chars[end] == '{' {
                        return Err(TemplateError::Parse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    if chars[end] == '}' {
                        closed = true;
                        break;
                    }
                    end += 1;
                }

                if !closed {
                    return Err(TemplateError::Parse("unclosed brace".to_string()));
                }

                let name: String = chars[start..end].iter().collect();
                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::Parse("empty braces".to_string()));
                }

                segments.push(TemplateSegment::Slot(name.to_string()));
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(TemplateError::Parse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Names of every slot referenced by this template, in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Slot(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Render the template, failing on the first slot without a binding.
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot(name) => {
                    let value = bindings
                        .get(name)
                        .ok_or_else(|| TemplateError::UnboundSlot(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render in one step, returning the source text unchanged when
/// it does not parse or references an unbound slot.
///
/// Used for fixed fallback tables, where a bad entry must never hide the line.
pub fn fill(source: &str, bindings: &Bindings) -> String {
    match Template::parse(source).and_then(|t| t.render(bindings)) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("template fill failed ({}), using raw text", e);
            source.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("古老城堡的大厅").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("古老城堡的大厅".to_string())]
        );
    }

    #[test]
    fn parse_slots_between_literals() {
        let t = Template::parse("在{location}的{timeOfDay}，{weather}。").unwrap();
        assert_eq!(t.segments.len(), 7);
        assert_eq!(t.segments[6], TemplateSegment::Literal("。".to_string()));
        assert_eq!(t.segments[1], TemplateSegment::Slot("location".to_string()));
        assert_eq!(t.segments[3], TemplateSegment::Slot("timeOfDay".to_string()));
        assert_eq!(
            t.slots().collect::<Vec<_>>(),
            vec!["location", "timeOfDay", "weather"]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Template::parse("Bad {} here").is_err());
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
        assert!(Template::parse("Bad {unclosed here").is_err());
        assert!(Template::parse("Bad } here").is_err());
    }

    #[test]
    fn render_with_bindings() {
        let t = Template::parse("我是{name}，很高兴见到你。").unwrap();
        let b = Bindings::new().with("name", "老张");
        assert_eq!(t.render(&b).unwrap(), "我是老张，很高兴见到你。");
    }

    #[test]
    fn render_unbound_slot_fails() {
        let t = Template::parse("{missing}").unwrap();
        assert_eq!(
            t.render(&Bindings::new()),
            Err(TemplateError::UnboundSlot("missing".to_string()))
        );
    }

    #[test]
    fn fill_falls_back_to_source() {
        assert_eq!(fill("你好{name}", &Bindings::new()), "你好{name}");
        assert_eq!(
            fill("你好{name}", &Bindings::new().with("name", "旅人")),
            "你好旅人"
        );
    }
}
