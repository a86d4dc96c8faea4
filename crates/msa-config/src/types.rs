//! Configuration types

use msa_core::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Whole configuration: a set of named sections
///
/// Section names are normalized to upper case, so `agent`, `Agent` and
/// `AGENT` all name the same section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sections: BTreeMap<String, Section>,
}

impl Config {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a section by name; an absent section reads as empty
    pub fn section(&self, name: &str) -> Section {
        let key = name.to_uppercase();
        self.sections
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Section::new(key))
    }

    /// Whether a section with this name exists
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(&name.to_uppercase())
    }

    /// Insert or replace a section
    pub fn insert_section(&mut self, section: Section) {
        self.sections.insert(section.name.clone(), section);
    }

    /// Builder-style variant of [`Config::insert_section`]
    pub fn with_section(mut self, section: Section) -> Self {
        self.insert_section(section);
        self
    }

    /// Names of all sections
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there are no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One configuration section: string keys to string values
///
/// Keys are normalized to upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    values: BTreeMap<String, String>,
}

impl Section {
    /// Create an empty section
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            values: BTreeMap::new(),
        }
    }

    /// Section name (upper case)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into().to_uppercase(), value.into());
    }

    /// Builder-style variant of [`Section::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_uppercase()).map(String::as_str)
    }

    /// Whether the key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_uppercase())
    }

    /// Parse a value, falling back to `default` when the key is absent
    ///
    /// A present but malformed value is an error rather than a silent default.
    pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    /// Parse an optional value
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::Config(format!(
                "Invalid value '{raw}' for {}.{}: {e}",
                self.name,
                key.to_uppercase()
            ))
        })
    }

    /// Comma-separated list value; empty items are dropped
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterate over `(key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the section has no keys
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_is_empty() {
        let config = Config::new();
        let section = config.section("agent");
        assert_eq!(section.name(), "AGENT");
        assert!(section.is_empty());
        assert!(!config.has_section("AGENT"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = Config::new().with_section(Section::new("agent").with("name", "Masa"));
        assert!(config.has_section("Agent"));
        assert_eq!(config.section("AGENT").get("NAME"), Some("Masa"));
        assert_eq!(config.section("agent").get("Name"), Some("Masa"));
    }

    #[test]
    fn test_get_or_parses_and_defaults() {
        let section = Section::new("input").with("history_size", "12");
        assert_eq!(section.get_or("HISTORY_SIZE", 50usize).unwrap(), 12);
        assert_eq!(section.get_or("MISSING", 50usize).unwrap(), 50);
    }

    #[test]
    fn test_get_or_rejects_malformed_value() {
        let section = Section::new("event").with("handler_timeout_ms", "soon");
        let err = section.get_or("HANDLER_TIMEOUT_MS", 0u64).unwrap_err();
        assert!(err.to_string().contains("EVENT.HANDLER_TIMEOUT_MS"));
    }

    #[test]
    fn test_get_parsed() {
        let section = Section::new("event").with("handler_timeout_ms", "250");
        assert_eq!(section.get_parsed::<u64>("HANDLER_TIMEOUT_MS").unwrap(), Some(250));
        assert_eq!(section.get_parsed::<u64>("OTHER").unwrap(), None);
    }

    #[test]
    fn test_get_list() {
        let section = Section::new("plugin").with("paths", "a.so, b.so,,c.so ");
        assert_eq!(section.get_list("PATHS"), vec!["a.so", "b.so", "c.so"]);
        assert!(section.get_list("DIR").is_empty());
    }
}
