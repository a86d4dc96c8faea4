//! `$NAME` placeholder substitution

use parking_lot::RwLock;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Replaces `$NAME` placeholders with registered values
///
/// Names are upper-case identifiers. Placeholders with no registered value
/// are left in the text as written.
#[derive(Debug)]
pub struct Expander {
    pattern: Regex,
    values: RwLock<BTreeMap<String, String>>,
}

impl Expander {
    /// Create an expander with no substitutions
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"\$([A-Z_][A-Z0-9_]*)")?,
            values: RwLock::new(BTreeMap::new()),
        })
    }

    /// Add a substitution unless one with that name already exists
    ///
    /// Returns `false` when the name was taken.
    pub fn register(&self, name: &str, value: &str) -> bool {
        let mut values = self.values.write();
        let key = name.trim().to_uppercase();
        if values.contains_key(&key) {
            return false;
        }
        values.insert(key, value.to_string());
        true
    }

    /// Add or overwrite a substitution
    pub fn set(&self, name: &str, value: &str) {
        self.values
            .write()
            .insert(name.trim().to_uppercase(), value.to_string());
    }

    /// Remove a substitution, returning its value
    pub fn unregister(&self, name: &str) -> Option<String> {
        self.values.write().remove(&name.trim().to_uppercase())
    }

    /// Current value of a substitution
    pub fn get(&self, name: &str) -> Option<String> {
        self.values.read().get(&name.trim().to_uppercase()).cloned()
    }

    /// All substitutions, sorted by name
    pub fn list(&self) -> Vec<(String, String)> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Substitute every known placeholder in `template`
    pub fn expand(&self, template: &str) -> String {
        let values = self.values.read();
        self.pattern
            .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_and_unknown() {
        let expander = Expander::new().unwrap();
        expander.set("user_title", "Master");

        assert_eq!(
            expander.expand("$USER_TITLE, meet $STRANGER."),
            "Master, meet $STRANGER."
        );
    }

    #[test]
    fn test_longest_identifier_wins() {
        let expander = Expander::new().unwrap();
        expander.set("A", "short");
        expander.set("AB", "long");

        assert_eq!(expander.expand("$AB $A"), "long short");
    }

    #[test]
    fn test_register_does_not_overwrite() {
        let expander = Expander::new().unwrap();
        assert!(expander.register("AGENT_NAME", "Masa"));
        assert!(!expander.register("agent_name", "Other"));
        assert_eq!(expander.get("AGENT_NAME").as_deref(), Some("Masa"));

        expander.set("AGENT_NAME", "Other");
        assert_eq!(expander.unregister("AGENT_NAME").as_deref(), Some("Other"));
        assert!(expander.list().is_empty());
    }

    #[test]
    fn test_values_are_not_re_expanded() {
        let expander = Expander::new().unwrap();
        expander.set("X", "$Y");
        expander.set("Y", "boom");
        assert_eq!(expander.expand("$X"), "$Y");
    }
}
