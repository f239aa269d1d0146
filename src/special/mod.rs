//! Special requirements - free-text layout/floor wishes to structured filters

mod gemini;
mod reply;

pub use gemini::GeminiClient;
pub use reply::{build_prompt, parse_reply};

use crate::data::{normalize_special_value, parse_layout, IntRange, SearchFilters};
use log::{info, warn};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecialError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Empty reply from model")]
    EmptyReply,
    #[error("No JSON object in reply")]
    NoJson,
    #[error("Reply JSON is not an object")]
    NotAnObject,
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A text-generation backend. Implemented by [`GeminiClient`]; tests use stubs.
pub trait LanguageModel {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, SpecialError>;
}

/// Layout and floor constraints taken from the special requirements text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialRequirements {
    pub rooms: Option<IntRange>,
    pub living_rooms: Option<IntRange>,
    pub bathrooms: Option<IntRange>,
    pub floor: Option<IntRange>,
}

impl SpecialRequirements {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_none()
            && self.living_rooms.is_none()
            && self.bathrooms.is_none()
            && self.floor.is_none()
    }

    /// Merge into the form filters; only the layout and floor fields change.
    pub fn apply(&self, filters: &mut SearchFilters) {
        if let Some(r) = self.rooms {
            filters.rooms = Some(r);
        }
        if let Some(r) = self.living_rooms {
            filters.living_rooms = Some(r);
        }
        if let Some(r) = self.bathrooms {
            filters.bathrooms = Some(r);
        }
        if let Some(r) = self.floor {
            filters.floor = Some(r);
        }
    }

    /// Short human-readable summary, e.g. `房:2 廳:2 衛:1 樓層:5以上`.
    pub fn describe(&self) -> String {
        [
            ("房", self.rooms),
            ("廳", self.living_rooms),
            ("衛", self.bathrooms),
            ("樓層", self.floor),
        ]
        .iter()
        .filter_map(|(label, range)| range.map(|r| format!("{label}:{r}")))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

static FLOOR_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let num = r"(?:[0-9]+|[一二兩三四五六七八九十〇零]+)";
    Regex::new(&format!(
        r"(?:至少|最多)\s*{num}\s*(?:樓|F|層)|{num}\s*(?:樓|F|層)?\s*(?:-|~|～|到|至)\s*{num}\s*(?:樓|F|層)|{num}\s*(?:樓|F|層)\s*(?:以上|以下|以內)?"
    ))
    .expect("valid regex")
});

/// Deterministic parser used when no language model is configured.
pub struct LocalParser;

impl LocalParser {
    pub fn parse(text: &str) -> SpecialRequirements {
        let layout = parse_layout(text);
        let floor = FLOOR_PHRASE_RE
            .find(text)
            .and_then(|m| normalize_special_value(&Value::String(m.as_str().to_string())));
        SpecialRequirements {
            rooms: layout.rooms.map(IntRange::exact),
            living_rooms: layout.living_rooms.map(IntRange::exact),
            bathrooms: layout.bathrooms.map(IntRange::exact),
            floor,
        }
    }
}

/// How the special requirements text is interpreted.
pub enum SpecialParser<'a> {
    Llm(&'a dyn LanguageModel),
    Local,
    Disabled,
}

/// Result of interpreting the special requirements text.
#[derive(Debug, Clone, Default)]
pub struct SpecialOutcome {
    pub requirements: SpecialRequirements,
    /// Raw model reply, kept for the debug view.
    pub raw_reply: Option<String>,
    /// Set when the model call or reply parsing failed.
    pub error: Option<String>,
    pub parser: Option<String>,
}

/// Interpret `text`. Failures leave the requirements empty and record the
/// error; the search proceeds without them.
pub fn resolve_special(text: &str, parser: SpecialParser<'_>) -> SpecialOutcome {
    let text = text.trim();
    if text.is_empty() {
        return SpecialOutcome::default();
    }

    match parser {
        SpecialParser::Disabled => SpecialOutcome::default(),
        SpecialParser::Local => {
            let requirements = LocalParser::parse(text);
            info!("Local special requirements: {}", requirements.describe());
            SpecialOutcome {
                requirements,
                parser: Some("local".to_string()),
                ..Default::default()
            }
        }
        SpecialParser::Llm(model) => {
            let mut outcome = SpecialOutcome {
                parser: Some(model.name().to_string()),
                ..Default::default()
            };
            match model.generate(&build_prompt(text)) {
                Ok(reply) => {
                    match parse_reply(&reply) {
                        Ok(requirements) => {
                            info!("Model special requirements: {}", requirements.describe());
                            outcome.requirements = requirements;
                        }
                        Err(e) => {
                            warn!("Could not parse model reply: {e}");
                            outcome.error = Some(format!("Gemini 解析特殊要求失敗: {e}"));
                        }
                    }
                    outcome.raw_reply = Some(reply.trim().to_string());
                }
                Err(e) => {
                    warn!("Model call failed: {e}");
                    outcome.error = Some(format!("Gemini 解析特殊要求失敗: {e}"));
                }
            }
            outcome
        }
    }
}
