//! Scrollplay: keyboard playlist navigation over an infinite-scroll card list.
//!
//! Scrollplay drives a page that renders media "cards" in pages as if it were a
//! linear playlist:
//! - Arrow keys step through cards and toggle playback by clicking them
//! - Reaching the last rendered card clicks the page's load-more button
//! - Jumping to a card that is not rendered yet loads until it exists
//! - Completion of a load is detected from the button's `disabled` flag

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Entry point (main.rs)                              │  ← keydown / stdin
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - Key routing and command dispatch                 │
//! │  - Playlist controller                              │
//! │  - Load gate                                        │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌───────────────────────┐   ┌─────────────────────────┐
//! │ Document Layer (dom/) │   │ Domain Layer (domain/)  │
//! │ - Document trait      │   │ - IndexedSequence       │
//! │ - In-memory tree      │   │ - Error types           │
//! │ - Feed simulator      │   └─────────────────────────┘
//! │ - web-sys binding     │
//! └───────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing subscriber writing to the console        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: playlist, load gate, key routing and the session root
//! - [`dom`]: the document abstraction and its implementations
//! - [`domain`]: [`IndexedSequence`] and errors
//! - [`observability`]: tracing setup
//!
//! # Configuration
//!
//! In the browser the configuration is read from a JSON script tag:
//!
//! ```html
//! <script type="application/json" id="scrollplay-config">
//!   { "load_more_selector": "main button", "keys": { "next": "j", "previous": "k" } }
//! </script>
//! ```
//!
//! Natively it can come from a TOML file (see [`Config::from_file`]).
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use futures::executor::LocalPool;
//! use scrollplay::dom::feed::FeedSimulator;
//! use scrollplay::dom::memory::MemoryDocument;
//! use scrollplay::{initialize, Command, Config};
//!
//! let document = Rc::new(MemoryDocument::new());
//! let feed = FeedSimulator::new(Rc::clone(&document), 2, 2);
//! let mut pool = LocalPool::new();
//!
//! let session = initialize(document, Rc::new(pool.spawner()), Config::default())?;
//! assert_eq!(session.handle_key("ArrowRight"), Some(Command::Next));
//!
//! // The last card was reached, so a load is in flight.
//! feed.settle();
//! pool.run_until_stalled();
//! assert_eq!(session.player().len(), 4);
//! # Ok::<(), scrollplay::ScrollplayError>(())
//! ```

pub mod app;
pub mod dom;
pub mod domain;

pub mod observability;

pub use app::{handle_command, Command, InputRouter, KeyBindings, PlaylistController, Session};
pub use domain::{IndexedSequence, Result, ScrollplayError};

use dom::Document;
use futures::task::LocalSpawn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

/// Page configuration.
///
/// Every field has a default matching the stock page layout, so an empty TOML or
/// JSON document is a valid configuration.
///
/// # Example
///
/// ```toml
/// card_selector = "#cards-container > div"
/// trigger_selector = "[role=\"button\"]"
/// load_more_selector = "main button"
/// trace_level = "debug"
///
/// [keys]
/// next = "ArrowRight"
/// previous = "ArrowLeft"
/// toggle_playback = "ArrowDown"
/// load_more = "ArrowUp"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Matches every card container, in playlist order.
    pub card_selector: String,

    /// Matches the play trigger inside one card container.
    pub trigger_selector: String,

    /// Matches the load-more button. Resolved once, when the session creates its gate.
    pub load_more_selector: String,

    /// Tracing filter directive.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error` or a full `EnvFilter`
    /// directive. Default: `"info"`
    pub trace_level: Option<String>,

    /// Key names bound to playlist commands.
    pub keys: KeyBindings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            card_selector: "#cards-container > div".to_string(),
            trigger_selector: "[role=\"button\"]".to_string(),
            load_more_selector: "main button".to_string(),
            trace_level: None,
            keys: KeyBindings::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a flat string map.
    ///
    /// Recognized keys are `card_selector`, `trigger_selector`, `load_more_selector`,
    /// `key_next`, `key_previous`, `key_toggle_playback`, `key_load_more` and
    /// `trace_level`. Missing or blank values keep their defaults; unknown keys are
    /// ignored. Selectors are trimmed, key names are taken as-is so `" "` binds the
    /// spacebar.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use scrollplay::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("key_next".to_string(), "j".to_string());
    /// map.insert("load_more_selector".to_string(), " ".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.keys.next, "j");
    /// assert_eq!(config.load_more_selector, "main button");
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let value = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        // Key names are matched verbatim; the spacebar is " ".
        let key = |name: &str| map.get(name).filter(|v| !v.is_empty()).cloned();

        let defaults = Self::default();
        Self {
            card_selector: value("card_selector").unwrap_or(defaults.card_selector),
            trigger_selector: value("trigger_selector").unwrap_or(defaults.trigger_selector),
            load_more_selector: value("load_more_selector").unwrap_or(defaults.load_more_selector),
            trace_level: value("trace_level"),
            keys: KeyBindings {
                next: key("key_next").unwrap_or(defaults.keys.next),
                previous: key("key_previous").unwrap_or(defaults.keys.previous),
                toggle_playback: key("key_toggle_playback")
                    .unwrap_or(defaults.keys.toggle_playback),
                load_more: key("key_load_more").unwrap_or(defaults.keys.load_more),
            },
        }
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Toml`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Json`] on malformed input.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Loads a configuration file, JSON when the extension is `.json`, TOML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Io`] if the file cannot be read, or a parse error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        tracing::debug!(path = %path.display(), is_json, "loading config file");
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Checks that selectors are non-blank and key bindings are unambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (name, selector) in [
            ("card_selector", &self.card_selector),
            ("trigger_selector", &self.trigger_selector),
            ("load_more_selector", &self.load_more_selector),
        ] {
            if selector.trim().is_empty() {
                return Err(ScrollplayError::Config(format!("{name} is empty")));
            }
        }
        self.keys.validate()
    }
}

/// Builds a session and its playlist.
///
/// The playlist is created eagerly so that the first rebuild runs and the session's
/// gate is subscribed before any key arrives.
///
/// # Errors
///
/// Returns [`ScrollplayError::Config`] if `config` fails validation.
pub fn initialize<D: Document>(
    document: Rc<D>,
    spawner: Rc<dyn LocalSpawn>,
    config: Config,
) -> Result<Session<D>> {
    tracing::debug!("initializing scrollplay session");

    let session = Session::new(document, spawner, config)?;
    let player = session.player();
    tracing::info!(cards = player.len(), "scrollplay ready");
    Ok(session)
}
