//! Replacement values gathered for detected placeholders.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::placeholder::{default_width, DEFAULT_IMAGE_WIDTH_IN};

/// An image to embed in place of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReplacement {
    pub path: PathBuf,
    /// Display width in inches; height follows the source aspect ratio.
    #[serde(default = "ImageReplacement::width_default")]
    pub width: f32,
}

impl ImageReplacement {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: DEFAULT_IMAGE_WIDTH_IN,
        }
    }

    pub fn with_width(path: impl Into<PathBuf>, width: f32) -> Self {
        Self {
            path: path.into(),
            width,
        }
    }

    /// Width defaulted by the placeholder naming heuristic (logos wider).
    pub fn for_placeholder(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: default_width(name),
        }
    }

    fn width_default() -> f32 {
        DEFAULT_IMAGE_WIDTH_IN
    }
}

/// Replacement map keyed by placeholder name (braces stripped). Built once
/// per run and immutable during substitution; ordered so output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replacements {
    #[serde(default)]
    pub text: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, ImageReplacement>,
}

impl Replacements {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }

    /// Whether a value has been supplied for a placeholder name.
    pub fn contains(&self, name: &str) -> bool {
        self.text.contains_key(name) || self.images.contains_key(name)
    }

    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text.insert(name.into(), value.into());
    }

    pub fn set_image(&mut self, name: impl Into<String>, image: ImageReplacement) {
        self.images.insert(name.into(), image);
    }
}
