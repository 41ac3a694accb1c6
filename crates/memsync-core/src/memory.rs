//! Memory records and the markdown parser that produces them
//!
//! A memory file is markdown with optional YAML front matter:
//!
//! ```markdown
//! ---
//! id: api-retry-policy
//! subject: Retry policy for outbound calls
//! tags: [http, resilience]
//! confidence: 0.8
//! ---
//! Body text that is sent to the remote service.
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value as YamlValue;

use crate::{Error, Result};

/// Confidence used when the front matter does not set one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A parsed local memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub id: String,
    pub subject: String,
    pub content: String,
    /// Ordered as written, possibly empty
    pub tags: Vec<String>,
    /// Within `0.0..=1.0`
    pub confidence: f64,
    /// Project-relative path the record was read from
    pub path: PathBuf,
}

/// Turns the bytes of a memory file into a [`MemoryRecord`]
pub trait MemoryParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, path: &Path, source: &[u8]) -> Result<MemoryRecord>;
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    id: Option<YamlValue>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    tags: Option<Vec<YamlValue>>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parser for markdown with optional `---` delimited YAML front matter
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontMatterParser;

impl FrontMatterParser {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryParser for FrontMatterParser {
    fn parse(&self, path: &Path, source: &[u8]) -> Result<MemoryRecord> {
        let text = std::str::from_utf8(source)
            .map_err(|e| Error::parse(path, format!("file is not valid UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let (front, body) = split_front_matter(text);
        let meta: FrontMatter = match front {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)
                .map_err(|e| Error::parse(path, format!("invalid front matter: {}", e)))?,
            _ => FrontMatter::default(),
        };

        let confidence = meta.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::parse(
                path,
                format!("confidence {} is outside 0.0-1.0", confidence),
            ));
        }

        let stem = file_stem(path);
        let id = meta
            .id
            .as_ref()
            .and_then(scalar_to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| stem.clone());
        let tags = meta
            .tags
            .unwrap_or_default()
            .iter()
            .filter_map(scalar_to_string)
            .collect();

        Ok(MemoryRecord {
            id,
            subject: meta.subject.unwrap_or_default(),
            content: body.to_string(),
            tags,
            confidence,
            path: path.to_path_buf(),
        })
    }
}

/// Split `text` into (front matter, body).
///
/// Front matter is only recognized when the very first line is `---`; it
/// ends at the next line that is exactly `---`. An opening `---` that is
/// never closed is a horizontal rule and the whole text is body.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let front = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return (Some(front), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The memory name of a path: its file stem
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
