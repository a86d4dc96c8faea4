//! The agent persona

use crate::expander::Expander;
use msa_plugin_api::{AgentSnapshot, AgentState, Mood};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI32, Ordering};

/// Substitution holding the agent's name
pub const AGENT_NAME_VAR: &str = "AGENT_NAME";

/// Substitution holding how the agent addresses the user
pub const USER_TITLE_VAR: &str = "USER_TITLE";

/// Default agent name
pub const DEFAULT_NAME: &str = "DEFAULT_NAME";

/// Default user title
pub const DEFAULT_USER_TITLE: &str = "Master";

/// Input prompt
pub const PROMPT: &str = "> ";

/// The character the user talks to
///
/// Name and user title are fixed at init. Mood, state and attitude may be
/// read and changed from any thread.
#[derive(Debug)]
pub struct Agent {
    name: String,
    user_title: String,
    state: RwLock<AgentState>,
    mood: RwLock<Mood>,
    attitude: AtomicI32,
    expander: Expander,
}

impl Agent {
    /// Create an agent with its own substitution table
    pub fn new(
        name: impl Into<String>,
        user_title: impl Into<String>,
        mood: Mood,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            user_title: user_title.into(),
            state: RwLock::new(AgentState::Idle),
            mood: RwLock::new(mood),
            attitude: AtomicI32::new(0),
            expander: Expander::new()?,
        })
    }

    /// Agent name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the agent addresses the user
    pub fn user_title(&self) -> &str {
        &self.user_title
    }

    /// Substitutions used for everything the agent says
    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Current mood
    pub fn mood(&self) -> Mood {
        *self.mood.read()
    }

    /// Change mood
    pub fn set_mood(&self, mood: Mood) {
        *self.mood.write() = mood;
    }

    /// Current activity
    pub fn state(&self) -> AgentState {
        *self.state.read()
    }

    /// Change activity
    pub fn set_state(&self, state: AgentState) {
        *self.state.write() = state;
    }

    /// Attitude toward the user
    pub fn attitude(&self) -> i32 {
        self.attitude.load(Ordering::Relaxed)
    }

    /// Shift attitude by `delta`, returning the new value
    ///
    /// Saturates at the bounds of `i32`.
    pub fn adjust_attitude(&self, delta: i32) -> i32 {
        let previous = self
            .attitude
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(delta))
            })
            .unwrap_or_else(|current| current);
        previous.saturating_add(delta)
    }

    /// The line written when the agent says `text`
    pub fn render_speech(&self, text: &str) -> String {
        self.expander
            .expand(&format!("${AGENT_NAME_VAR}: \"{text}\"\n"))
    }

    /// The input prompt, expanded
    pub fn render_prompt(&self) -> String {
        self.expander.expand(PROMPT)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            name: self.name.clone(),
            user_title: self.user_title.clone(),
            state: self.state(),
            mood: self.mood(),
            attitude: self.attitude(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        let agent = Agent::new("Masa", "Master", Mood::Normal).unwrap();
        agent.expander().set(AGENT_NAME_VAR, agent.name());
        agent.expander().set(USER_TITLE_VAR, agent.user_title());
        agent
    }

    #[test]
    fn test_speech_format() {
        let agent = agent();
        assert_eq!(
            agent.render_speech("Hello, $USER_TITLE"),
            "Masa: \"Hello, Master\"\n"
        );
        assert_eq!(agent.render_prompt(), "> ");
    }

    #[test]
    fn test_snapshot_tracks_changes() {
        let agent = agent();
        agent.set_mood(Mood::Happy);
        agent.set_state(AgentState::Busy);
        assert_eq!(agent.adjust_attitude(3), 3);
        assert_eq!(agent.adjust_attitude(-1), 2);

        let snapshot = agent.snapshot();
        assert_eq!(snapshot.name, "Masa");
        assert_eq!(snapshot.mood, Mood::Happy);
        assert_eq!(snapshot.state, AgentState::Busy);
        assert_eq!(snapshot.attitude, 2);
    }

    #[test]
    fn test_attitude_saturates() {
        let agent = agent();
        assert_eq!(agent.adjust_attitude(i32::MAX), i32::MAX);
        assert_eq!(agent.adjust_attitude(1), i32::MAX);
        assert_eq!(agent.adjust_attitude(i32::MIN), -1);
        assert_eq!(agent.adjust_attitude(i32::MIN), i32::MIN);
    }
}
