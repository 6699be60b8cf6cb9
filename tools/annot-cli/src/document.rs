use std::fs;
use std::path::Path;

use annot_controller::ControllerConfig;
use annot_protocol::{Label, Span};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What a host holds between gestures: the tokens and the current spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tokens: Vec<String>,
    #[serde(default)]
    pub value: Vec<Span<Label>>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading document {}", path.display()))?;
        let doc: Document = serde_json::from_str(&raw)
            .with_context(|| format!("parsing document {}", path.display()))?;
        Ok(doc)
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            tokens: annot_segmenter::tokenize(text)
                .into_iter()
                .map(|(_, t)| t.to_string())
                .collect(),
            value: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[derive(Debug, Serialize)]
pub struct SegmentRow {
    pub start: usize,
    pub end: usize,
    pub marked: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
