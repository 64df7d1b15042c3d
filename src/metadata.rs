use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::config;
use crate::error::Result;
use crate::frame::FrameType;

/// Normalized metadata of one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    values: BTreeMap<String, Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Value for `key` unless it is absent or null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// Scalar value rendered as it appears in paths and filenames.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(render_scalar)
    }

    pub fn frame_type_value(&self) -> Option<String> {
        self.text(config::TYPE)
    }
}

impl From<serde_json::Map<String, Value>> for Metadata {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Selection criteria handed to a [`MetadataSource`].
#[derive(Debug, Clone)]
pub struct MetadataQuery {
    pub dirs: Vec<PathBuf>,
    pub patterns: Vec<Regex>,
    pub recursive: bool,
    pub required_properties: Vec<String>,
    pub frame_type: Option<FrameType>,
    /// Exact-match filters on other string properties.
    pub filters: BTreeMap<String, String>,
    pub debug: bool,
}

impl MetadataQuery {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            patterns: Vec::new(),
            recursive: true,
            required_properties: Vec::new(),
            frame_type: None,
            filters: BTreeMap::new(),
            debug: false,
        }
    }

    pub fn with_patterns(mut self, patterns: &[&str]) -> Result<Self> {
        self.patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self)
    }

    pub fn frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(file_name))
    }

    /// Whether a record passes the required-property and filter checks.
    pub fn accepts(&self, metadata: &Metadata) -> bool {
        if let Some(wanted) = self.frame_type {
            let actual = metadata.frame_type_value().and_then(|t| FrameType::parse(&t));
            if actual != Some(wanted) {
                return false;
            }
        }
        if self
            .required_properties
            .iter()
            .any(|key| metadata.get(key).is_none())
        {
            return false;
        }
        self.filters
            .iter()
            .all(|(key, wanted)| metadata.text(key).as_deref() == Some(wanted.as_str()))
    }
}

/// Provides metadata records for files under a set of directories.
pub trait MetadataSource {
    fn filtered_metadata(&self, query: &MetadataQuery) -> Result<BTreeMap<PathBuf, Metadata>>;
}

/// Reads each image's metadata from a `<file>.json` sidecar next to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SidecarSource;

impl SidecarSource {
    pub fn sidecar_path(file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }

    fn read_sidecar(file: &Path) -> Option<Metadata> {
        let sidecar = Self::sidecar_path(file);
        let raw = match fs::read_to_string(&sidecar) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("No metadata for {}: {}", file.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(Metadata::from(map)),
            Ok(_) => {
                log::warn!("Ignoring {}: not a JSON object", sidecar.display());
                None
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", sidecar.display(), e);
                None
            }
        }
    }
}

impl MetadataSource for SidecarSource {
    fn filtered_metadata(&self, query: &MetadataQuery) -> Result<BTreeMap<PathBuf, Metadata>> {
        let mut found = BTreeMap::new();
        for dir in &query.dirs {
            let mut walker = WalkDir::new(dir).follow_links(true);
            if !query.recursive {
                walker = walker.max_depth(1);
            }
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Cannot read directory entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(file_name) = entry.file_name().to_str() else {
                    continue;
                };
                if !query.matches_name(file_name) {
                    continue;
                }
                let Some(metadata) = Self::read_sidecar(entry.path()) else {
                    continue;
                };
                if query.accepts(&metadata) {
                    if query.debug {
                        log::debug!("Matched {}", entry.path().display());
                    }
                    found.insert(entry.into_path(), metadata);
                }
            }
        }
        Ok(found)
    }
}
