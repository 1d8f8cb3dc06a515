//! Application layer: the playlist and everything that drives it.
//!
//! ```text
//! key name → InputRouter → Command → handle_command → PlaylistController
//!                                                        │         │
//!                                            IndexedSequence<Card> LoadGate
//!                                                                    │
//!                                  load-more click, wait for clear ──┘
//! ```
//!
//! # Modules
//!
//! - [`card`]: one playable card and its activation
//! - [`gate`]: the load-more trigger and its loaded-callbacks
//! - [`player`]: playlist navigation, rebuilds and jumps
//! - [`keymap`]: key bindings and routing
//! - [`handler`]: command dispatch
//! - [`session`]: the single-instance owner of gate and player
//!
//! # Example
//!
//! ```rust
//! use scrollplay::app::{Command, InputRouter};
//!
//! let router = InputRouter::default();
//! assert_eq!(router.route("ArrowRight"), Some(Command::Next));
//! ```

pub mod card;
pub mod gate;
pub mod handler;
pub mod keymap;
pub mod player;
pub mod session;

pub use card::Card;
pub use gate::LoadGate;
pub use handler::handle_command;
pub use keymap::{Command, InputRouter, KeyBindings};
pub use player::{CardSelectors, PlaylistController};
pub use session::Session;
