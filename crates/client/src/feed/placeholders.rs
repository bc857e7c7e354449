//! Blur placeholder lookup for responsive images.

use std::collections::BTreeMap;

use porchlight_core::Error;
use serde::{Deserialize, Serialize};

/// Image base name to base64 data URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderMap(BTreeMap<String, String>);

impl PlaceholderMap {
    pub fn from_json(input: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn get(&self, base_name: &str) -> Option<&str> {
        self.0.get(base_name).map(String::as_str)
    }

    /// Look up by image path, e.g. `assets/images/hero-640.webp` -> `hero`.
    ///
    /// A trailing `-<width>` suffix from a resized variant is ignored.
    pub fn for_image(&self, path: &str) -> Option<&str> {
        let file = path.rsplit('/').next().unwrap_or(path);
        let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
        self.get(stem).or_else(|| {
            let (base, width) = stem.rsplit_once('-')?;
            if !width.is_empty() && width.bytes().all(|b| b.is_ascii_digit()) { self.get(base) } else { None }
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
