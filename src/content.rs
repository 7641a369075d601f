//! Page content held in memory and the change values that flow between components.
//!
//! Every piece of dynamic template or style source is addressed by a *file
//! key*: the file name with its extension stripped (`page.html` -> `page`).
//! The database keeps all keys in one aggregate document, and each server
//! keeps a [`ContentSnapshot`] of that document.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+").expect("static key pattern compiles"));

/// Derive the file key from a path.
///
/// Takes the leading word characters of the file name, so `page.html`,
/// `page.min.css` and `page` all map to `page`. Returns `None` when the
/// name has no leading word characters (editor temp files like `.#page`).
pub fn file_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    KEY_PATTERN
        .find(name)
        .map(|m| m.as_str().to_string())
}

/// Where a change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSource {
    /// A save in the watched template directory.
    Local,
    /// A write observed on the database change stream.
    Database,
}

/// One or more `(key, content)` pairs that changed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    entries: BTreeMap<String, String>,
    source: ChangeSource,
}

impl ChangeEvent {
    /// A single changed key.
    pub fn single(key: impl Into<String>, content: impl Into<String>, source: ChangeSource) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.into(), content.into());
        Self { entries, source }
    }

    /// A change read from a local file.
    pub fn local(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self::single(key, content, ChangeSource::Local)
    }

    /// A change observed on the database.
    pub fn database(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self::single(key, content, ChangeSource::Database)
    }

    pub fn from_entries<I, K, V>(entries: I, source: ChangeSource) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source,
        }
    }

    pub fn source(&self) -> ChangeSource {
        self.source
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory copy of the aggregate content document.
///
/// Loaded once at startup, then patched key by key as changes arrive.
/// Keys that are not part of a change are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSnapshot {
    fields: BTreeMap<String, String>,
}

impl ContentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the keys carried by `event`. Returns the number of keys whose
    /// content actually changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> usize {
        let mut changed = 0;
        for (key, content) in event.entries() {
            let previous = self.fields.insert(key.to_string(), content.to_string());
            if previous.as_deref() != Some(content) {
                changed += 1;
            }
        }
        changed
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        self.fields.insert(key.into(), content.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for ContentSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
