//! Keyboard routing.
//!
//! Keys are matched by their DOM `KeyboardEvent.key` name (`"ArrowRight"`, `"j"`, ...).
//! Modifiers are not considered and repeats are forwarded like any other press.

use crate::domain::{Result, ScrollplayError};
use serde::{Deserialize, Serialize};

/// Playlist operation requested by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    TogglePlayback,
    LoadMore,
}

impl Command {
    pub const ALL: [Self; 4] = [
        Self::Next,
        Self::Previous,
        Self::TogglePlayback,
        Self::LoadMore,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::TogglePlayback => "toggle_playback",
            Self::LoadMore => "load_more",
        }
    }
}

/// Key name bound to each [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub next: String,
    pub previous: String,
    pub toggle_playback: String,
    pub load_more: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            next: "ArrowRight".to_string(),
            previous: "ArrowLeft".to_string(),
            toggle_playback: "ArrowDown".to_string(),
            load_more: "ArrowUp".to_string(),
        }
    }
}

impl KeyBindings {
    #[must_use]
    pub fn key_for(&self, command: Command) -> &str {
        match command {
            Command::Next => &self.next,
            Command::Previous => &self.previous,
            Command::TogglePlayback => &self.toggle_playback,
            Command::LoadMore => &self.load_more,
        }
    }

    /// Rejects empty key names and keys bound to more than one command.
    ///
    /// Whitespace is a real key name: `" "` is the spacebar.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Config`] naming the offending command.
    pub fn validate(&self) -> Result<()> {
        for (position, command) in Command::ALL.iter().enumerate() {
            let key = self.key_for(*command);
            if key.is_empty() {
                return Err(ScrollplayError::Config(format!(
                    "no key bound to {}",
                    command.id()
                )));
            }
            if let Some(other) = Command::ALL[..position]
                .iter()
                .find(|other| self.key_for(**other) == key)
            {
                return Err(ScrollplayError::Config(format!(
                    "key {key:?} bound to both {} and {}",
                    other.id(),
                    command.id()
                )));
            }
        }
        Ok(())
    }
}

/// Translates key names into [`Command`]s.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    bindings: KeyBindings,
}

impl InputRouter {
    #[must_use]
    pub const fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    #[must_use]
    pub const fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    #[must_use]
    pub fn route(&self, key: &str) -> Option<Command> {
        Command::ALL
            .into_iter()
            .find(|command| self.bindings.key_for(*command) == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_use_arrow_keys() {
        let router = InputRouter::default();
        assert_eq!(router.route("ArrowRight"), Some(Command::Next));
        assert_eq!(router.route("ArrowLeft"), Some(Command::Previous));
        assert_eq!(router.route("ArrowDown"), Some(Command::TogglePlayback));
        assert_eq!(router.route("ArrowUp"), Some(Command::LoadMore));
    }

    #[test]
    fn unbound_keys_route_nowhere() {
        let router = InputRouter::default();
        assert_eq!(router.route("Enter"), None);
        assert_eq!(router.route("arrowright"), None);
        assert_eq!(router.route(""), None);
    }

    #[test]
    fn custom_bindings_replace_defaults() {
        let router = InputRouter::new(KeyBindings {
            next: "j".to_string(),
            previous: "k".to_string(),
            ..KeyBindings::default()
        });
        assert_eq!(router.route("j"), Some(Command::Next));
        assert_eq!(router.route("ArrowRight"), None);
        assert_eq!(router.route("ArrowUp"), Some(Command::LoadMore));
    }

    #[test]
    fn spacebar_can_be_bound() {
        let bindings = KeyBindings {
            toggle_playback: " ".to_string(),
            ..KeyBindings::default()
        };
        bindings.validate().unwrap();

        let router = InputRouter::new(bindings);
        assert_eq!(router.route(" "), Some(Command::TogglePlayback));
        assert_eq!(router.route("ArrowDown"), None);
    }

    #[test]
    fn validate_rejects_shared_and_empty_keys() {
        assert!(KeyBindings::default().validate().is_ok());

        let shared = KeyBindings {
            load_more: "ArrowRight".to_string(),
            ..KeyBindings::default()
        };
        let err = shared.validate().unwrap_err();
        assert!(err.to_string().contains("next and load_more"), "{err}");

        let empty = KeyBindings {
            previous: String::new(),
            ..KeyBindings::default()
        };
        let err = empty.validate().unwrap_err();
        assert!(err.to_string().contains("previous"), "{err}");
    }
}
