//! Configuration validation
//!
//! Only keys the built-in modules understand are checked. Unknown sections
//! and keys are allowed so plugins can carry their own settings.

use crate::Config;
use msa_core::{Error, Result};

const LOG_LEVELS: [&str; 4] = ["trace", "debug", "info", "error"];
const OUTPUT_TARGETS: [&str; 2] = ["stdout", "stderr"];
const MOODS: [&str; 4] = ["normal", "happy", "sad", "angry"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_log(config)?;
    validate_output(config)?;
    validate_event(config)?;
    validate_input(config)?;
    validate_agent(config)?;
    validate_plugin(config)?;

    Ok(())
}

fn one_of(config: &Config, section: &str, key: &str, allowed: &[&str]) -> Result<()> {
    let section = config.section(section);
    if let Some(value) = section.get(key) {
        if !allowed.contains(&value.trim().to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid {}.{}: '{}' (must be one of {})",
                section.name(),
                key,
                value,
                allowed.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_log(config: &Config) -> Result<()> {
    one_of(config, "LOG", "LEVEL", &LOG_LEVELS)
}

fn validate_output(config: &Config) -> Result<()> {
    one_of(config, "OUTPUT", "TARGET", &OUTPUT_TARGETS)
}

fn validate_event(config: &Config) -> Result<()> {
    let timeout = config
        .section("EVENT")
        .get_parsed::<u64>("HANDLER_TIMEOUT_MS")?;

    if timeout == Some(0) {
        return Err(Error::Config(
            "EVENT.HANDLER_TIMEOUT_MS must be > 0 (omit it to wait forever)".to_string(),
        ));
    }

    Ok(())
}

fn validate_input(config: &Config) -> Result<()> {
    let history = config.section("INPUT").get_parsed::<usize>("HISTORY_SIZE")?;

    if history == Some(0) {
        tracing::warn!("INPUT.HISTORY_SIZE is 0, no input history will be kept");
    }

    Ok(())
}

fn validate_agent(config: &Config) -> Result<()> {
    let agent = config.section("AGENT");

    if let Some(name) = agent.get("NAME") {
        if name.trim().is_empty() {
            return Err(Error::Config("AGENT.NAME cannot be empty".to_string()));
        }
    }

    one_of(config, "AGENT", "MOOD", &MOODS)
}

fn validate_plugin(config: &Config) -> Result<()> {
    let plugin = config.section("PLUGIN");

    if plugin.contains("PATHS") && plugin.get_list("PATHS").is_empty() {
        tracing::warn!("PLUGIN.PATHS is set but lists no plugin units");
    }

    if let Some(dir) = plugin.get("DIR") {
        if dir.trim().is_empty() {
            return Err(Error::Config("PLUGIN.DIR cannot be empty".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Section;

    fn config_with(section: Section) -> Config {
        Config::new().with_section(section)
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&Config::new()).is_ok());
    }

    #[test]
    fn test_valid_config() {
        let config = Config::new()
            .with_section(Section::new("log").with("level", "debug"))
            .with_section(Section::new("output").with("target", "stderr"))
            .with_section(Section::new("event").with("handler_timeout_ms", "1500"))
            .with_section(Section::new("agent").with("name", "Masa").with("mood", "Happy"));

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = config_with(Section::new("log").with("level", "verbose"));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("LOG.LEVEL"));
    }

    #[test]
    fn test_invalid_output_target() {
        let config = config_with(Section::new("output").with("target", "printer"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_handler_timeout() {
        let config = config_with(Section::new("event").with("handler_timeout_ms", "0"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_malformed_history_size() {
        let config = config_with(Section::new("input").with("history_size", "lots"));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("INPUT.HISTORY_SIZE"));
    }

    #[test]
    fn test_empty_agent_name() {
        let config = config_with(Section::new("agent").with("name", "  "));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_unknown_mood() {
        let config = config_with(Section::new("agent").with("mood", "sleepy"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_unknown_sections_are_allowed() {
        let config = config_with(Section::new("plugin_example").with("anything", "goes"));
        assert!(validate_config(&config).is_ok());
    }
}
