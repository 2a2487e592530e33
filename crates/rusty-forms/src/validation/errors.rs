// File: src/validation/errors.rs
// Purpose: Error collection keyed by field path

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Validation messages keyed by field path
///
/// Paths are dotted, with collection indices as segments (`songs.2.title`).
/// Form-level messages live under the base key (`base` unless configured).
/// Replaced wholesale on every validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Errors {
    messages: BTreeMap<String, Vec<String>>,
    base_key: String,
}

impl Default for Errors {
    fn default() -> Self {
        Self::new("base")
    }
}

impl Errors {
    pub fn new(base_key: impl Into<String>) -> Self {
        Self {
            messages: BTreeMap::new(),
            base_key: base_key.into(),
        }
    }

    /// Messages for one path keep insertion order; duplicates are dropped
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        let entry = self.messages.entry(path.into()).or_default();
        if !entry.contains(&message) {
            entry.push(message);
        }
    }

    pub fn add_to_base(&mut self, message: impl Into<String>) {
        let key = self.base_key.clone();
        self.add(key, message);
    }

    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    /// Empty slice when the path has no errors
    pub fn get(&self, path: &str) -> &[String] {
        self.messages.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, path: &str) -> Option<&str> {
        self.get(path).first().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.messages.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of paths with errors
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Number of messages over all paths
    pub fn message_count(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.messages.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// "Songs 0 title can't be blank"; base messages are used as they are
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(path, messages)| {
                messages.iter().map(move |message| {
                    if path == self.base_key {
                        message.clone()
                    } else {
                        format!("{} {}", humanize(path), message)
                    }
                })
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Copies a nested form's errors under `prefix`
    pub(crate) fn merge_prefixed(&mut self, prefix: &str, other: &Errors) {
        for (path, messages) in other.iter() {
            let full = format!("{prefix}.{path}");
            for message in messages {
                self.add(full.clone(), message.clone());
            }
        }
    }

    /// Keeps only the first message of every path
    pub(crate) fn truncate_to_first(&mut self) {
        for messages in self.messages.values_mut() {
            messages.truncate(1);
        }
    }
}

impl Serialize for Errors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.messages.serialize(serializer)
    }
}

fn humanize(path: &str) -> String {
    let spaced = path.replace(['.', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_and_lookup() {
        let mut errors = Errors::default();
        errors.add("title", "can't be blank");
        errors.add("title", "is too short (minimum is 2 characters)");
        errors.add("title", "can't be blank");

        assert_eq!(errors.get("title").len(), 2);
        assert_eq!(errors.first("title"), Some("can't be blank"));
        assert!(errors.get("artist").is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message_count(), 2);
    }

    #[test]
    fn test_merge_prefixed() {
        let mut song = Errors::default();
        song.add("title", "can't be blank");
        song.add_to_base("is a duplicate");

        let mut album = Errors::default();
        album.merge_prefixed("songs.1", &song);

        let paths: Vec<&str> = album.paths().collect();
        assert_eq!(paths, vec!["songs.1.base", "songs.1.title"]);
    }

    #[test]
    fn test_full_messages() {
        let mut errors = Errors::new("form");
        errors.add("songs.0.title", "can't be blank");
        errors.add("release_date", "is not a valid date");
        errors.add_to_base("is locked");

        assert_eq!(
            errors.full_messages(),
            vec![
                "is locked".to_string(),
                "Release date is not a valid date".to_string(),
                "Songs 0 title can't be blank".to_string(),
            ]
        );
    }

    #[test]
    fn test_serializes_as_object() {
        let mut errors = Errors::default();
        errors.add("title", "can't be blank");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"title": ["can't be blank"]}));
    }
}
