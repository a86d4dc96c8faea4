//! Configuration loading

use crate::types::{Config, Section};
use crate::ConfigFormat;
use msa_core::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match (env::var(var_name), default_value) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(Error::Config(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;
    if expanded_content.trim().is_empty() {
        return Ok(Config::new());
    }

    let document: Value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    from_document(document)
}

/// Load and validate a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = load_from_file(path)?;
    crate::validator::validate_config(&config)?;
    Ok(config)
}

/// Turn a parsed document into sections.
///
/// The document root must be a map of maps. An empty document (YAML `~` or an
/// empty file) yields an empty configuration.
fn from_document(document: Value) -> Result<Config> {
    let root = match document {
        Value::Null => return Ok(Config::new()),
        Value::Object(root) => root,
        other => {
            return Err(Error::Config(format!(
                "Configuration root must be a table of sections, found {}",
                kind(&other)
            )))
        }
    };

    let mut config = Config::new();
    for (name, body) in root {
        let mut section = Section::new(&name);
        match body {
            Value::Null => {}
            Value::Object(entries) => {
                for (key, value) in entries {
                    flatten_into(&mut section, key, value)?;
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "Section '{}' must be a table, found {}",
                    section.name(),
                    kind(&other)
                )))
            }
        }
        tracing::trace!(section = %section.name(), keys = section.len(), "Loaded config section");
        config.insert_section(section);
    }

    Ok(config)
}

fn flatten_into(section: &mut Section, key: String, value: Value) -> Result<()> {
    match value {
        Value::Object(nested) => {
            for (child, value) in nested {
                flatten_into(section, format!("{key}.{child}"), value)?;
            }
        }
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match scalar(&item) {
                    Some(text) => parts.push(text),
                    None => {
                        return Err(Error::Config(format!(
                            "List value {}.{key} may only contain scalars",
                            section.name()
                        )))
                    }
                }
            }
            section.insert(key, parts.join(","));
        }
        other => {
            // objects and arrays handled above
            let text = scalar(&other).unwrap_or_default();
            section.insert(key, text);
        }
    }
    Ok(())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}
