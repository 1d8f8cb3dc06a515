//! Application root.

use super::gate::LoadGate;
use super::handler::handle_command;
use super::keymap::{Command, InputRouter};
use super::player::{CardSelectors, PlaylistController};
use crate::dom::Document;
use crate::domain::Result;
use crate::Config;
use futures::task::LocalSpawn;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// Owns everything one page needs: the document, the executor for load waits, the
/// single [`LoadGate`] and the single live [`PlaylistController`].
///
/// The gate and player are created on first use and live as long as the session.
/// Asking for them again always returns the same instances, so callbacks registered
/// on the gate are never lost to a second initialization.
pub struct Session<D: Document> {
    document: Rc<D>,
    spawner: Rc<dyn LocalSpawn>,
    config: Config,
    router: InputRouter,
    gate: OnceCell<Rc<LoadGate<D>>>,
    player: OnceCell<Rc<PlaylistController<D>>>,
}

impl<D: Document> Session<D> {
    /// Creates a session after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollplayError::Config`](crate::ScrollplayError::Config) when a
    /// selector is blank or the key bindings conflict.
    pub fn new(document: Rc<D>, spawner: Rc<dyn LocalSpawn>, config: Config) -> Result<Self> {
        config.validate()?;
        let router = InputRouter::new(config.keys.clone());
        Ok(Self {
            document,
            spawner,
            config,
            router,
            gate: OnceCell::new(),
            player: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn document(&self) -> &Rc<D> {
        &self.document
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn router(&self) -> &InputRouter {
        &self.router
    }

    /// The session's load gate, created on first call.
    pub fn load_gate(&self) -> Rc<LoadGate<D>> {
        let gate = self.gate.get_or_init(|| {
            tracing::debug!(selector = %self.config.load_more_selector, "creating load gate");
            Rc::new(LoadGate::new(
                Rc::clone(&self.document),
                Rc::clone(&self.spawner),
                &self.config.load_more_selector,
            ))
        });
        Rc::clone(gate)
    }

    /// The session's playlist, created (and rebuilt from the document) on first call.
    pub fn player(&self) -> Rc<PlaylistController<D>> {
        let player = self.player.get_or_init(|| {
            PlaylistController::new(
                Rc::clone(&self.document),
                CardSelectors::new(
                    self.config.card_selector.clone(),
                    self.config.trigger_selector.clone(),
                ),
                self.load_gate(),
            )
        });
        Rc::clone(player)
    }

    /// Routes a key press and applies the resulting command.
    ///
    /// Returns the command that ran, or `None` for unbound keys.
    pub fn handle_key(&self, key: &str) -> Option<Command> {
        let Some(command) = self.router.route(key) else {
            tracing::trace!(key, "unbound key");
            return None;
        };
        handle_command(&self.player(), command);
        Some(command)
    }
}

impl<D: Document> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("gate", &self.gate.get())
            .field("player", &self.player.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::keymap::KeyBindings;
    use crate::dom::feed::FeedSimulator;
    use crate::dom::memory::MemoryDocument;
    use crate::ScrollplayError;
    use futures::executor::LocalPool;
    use std::cell::Cell;

    fn session(config: Config) -> (FeedSimulator, LocalPool, Session<MemoryDocument>) {
        let document = Rc::new(MemoryDocument::new());
        let feed = FeedSimulator::new(Rc::clone(&document), 3, 3);
        let pool = LocalPool::new();
        let session = Session::new(document, Rc::new(pool.spawner()), config)
            .expect("valid config");
        (feed, pool, session)
    }

    #[test]
    fn load_gate_is_created_once() {
        let (feed, mut pool, session) = session(Config::default());
        let first = session.load_gate();

        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        first.on_loaded_once(move || counter.set(counter.get() + 1));

        let second = session.load_gate();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(feed.document().listener_count(feed.load_more_button()), 2);

        second.load();
        feed.settle();
        pool.run_until_stalled();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn player_shares_the_session_gate() {
        let (feed, _pool, session) = session(Config::default());
        let player = session.player();
        assert!(Rc::ptr_eq(player.gate(), &session.load_gate()));
        assert!(Rc::ptr_eq(&player, &session.player()));
        assert_eq!(player.len(), 3);
        assert_eq!(feed.document().listener_count(feed.load_more_button()), 2);
    }

    #[test]
    fn handle_key_routes_bound_keys_only() {
        let (feed, _pool, session) = session(Config::default());
        assert_eq!(session.handle_key("ArrowDown"), Some(Command::TogglePlayback));
        assert_eq!(feed.now_playing(), Some(0));

        assert_eq!(session.handle_key("Escape"), None);
        assert_eq!(feed.activations(), 1);

        assert_eq!(session.handle_key("ArrowRight"), Some(Command::Next));
        assert_eq!(session.player().current_index(), Some(1));
    }

    #[test]
    fn invalid_bindings_are_rejected() {
        let document = Rc::new(MemoryDocument::new());
        let pool = LocalPool::new();
        let config = Config {
            keys: KeyBindings {
                previous: "ArrowRight".to_string(),
                ..KeyBindings::default()
            },
            ..Config::default()
        };
        let err = Session::new(document, Rc::new(pool.spawner()), config).unwrap_err();
        assert!(matches!(err, ScrollplayError::Config(_)));
    }
}
