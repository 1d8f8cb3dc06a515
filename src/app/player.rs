//! Playlist navigation over the rendered cards.
//!
//! [`PlaylistController`] wraps an [`IndexedSequence`] of [`Card`]s and adds what
//! the page needs on top of plain cursor movement:
//!
//! - rebuilding the sequence from the document whenever a load completes
//! - toggling playback by clicking the current card
//! - asking for more cards when the cursor reaches the last known one
//! - jumping to a card that has not been rendered yet by loading until it exists
//!
//! # Jump indexing
//!
//! [`play`](PlaylistController::play) moves the cursor to `index - 1` but compares
//! `index` itself against the number of known cards. Callers therefore address cards
//! one-based while "is it loaded?" is checked as if zero-based, so `play(len)`
//! still triggers a load. Both halves are kept as-is and pinned by tests.

use super::card::Card;
use super::gate::LoadGate;
use crate::domain::IndexedSequence;
use crate::dom::Document;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// How cards and their play triggers are found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    /// Matches every card container, in playlist order.
    pub container: String,
    /// Matches the play trigger inside one container.
    pub trigger: String,
}

impl CardSelectors {
    #[must_use]
    pub fn new(container: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            trigger: trigger.into(),
        }
    }
}

/// Keyboard-driven playlist over the page's cards.
pub struct PlaylistController<D: Document> {
    document: Rc<D>,
    selectors: CardSelectors,
    gate: Rc<LoadGate<D>>,
    sequence: Rc<RefCell<IndexedSequence<Card<D>>>>,
}

impl<D: Document> PlaylistController<D> {
    /// Creates the controller, subscribes it to completed loads and runs the first
    /// rebuild.
    ///
    /// The gate's repeating loaded-callback is taken over by this controller.
    pub fn new(document: Rc<D>, selectors: CardSelectors, gate: Rc<LoadGate<D>>) -> Rc<Self> {
        let player = Rc::new(Self {
            document,
            selectors,
            gate,
            sequence: Rc::new(RefCell::new(IndexedSequence::new())),
        });

        let weak = Rc::downgrade(&player);
        player.gate.on_loaded_repeating(move || {
            if let Some(player) = weak.upgrade() {
                player.rebuild();
            }
        });

        player.rebuild();
        player
    }

    #[must_use]
    pub fn selectors(&self) -> &CardSelectors {
        &self.selectors
    }

    #[must_use]
    pub fn gate(&self) -> &Rc<LoadGate<D>> {
        &self.gate
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.sequence.borrow().current_index()
    }

    /// Moves the cursor without toggling playback; out-of-range values are ignored.
    pub fn set_current_index(&self, index: usize) {
        self.sequence.borrow_mut().set_current_index(index);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.borrow().is_empty()
    }

    /// Re-derives the card list from the document.
    ///
    /// Containers without a trigger are skipped. Each kept trigger gets an `onclick`
    /// handler moving the cursor to its position, so cards clicked by the user keep
    /// the cursor in sync.
    pub fn rebuild(&self) {
        let containers = self.document.query_selector_all(&self.selectors.container);
        let found = containers.len();

        let cards: Vec<Card<D>> = containers
            .iter()
            .filter_map(|container| {
                self.document
                    .query_selector_within(container, &self.selectors.trigger)
            })
            .enumerate()
            .map(|(position, trigger)| {
                self.bind_trigger(&trigger, position);
                Card::new(Rc::clone(&self.document), trigger)
            })
            .collect();

        tracing::debug!(
            containers = found,
            cards = cards.len(),
            "playlist rebuilt"
        );
        self.sequence.borrow_mut().set_nodes(cards);
    }

    /// Jumps to card `index - 1`, loading more cards first if `index` is not known.
    ///
    /// While `index` is out of range this registers a one-shot loaded-callback that
    /// retries the jump and requests a load, repeating until enough cards exist.
    pub fn play(self: &Rc<Self>, index: usize) {
        let known = {
            let mut sequence = self.sequence.borrow_mut();
            if let Some(target) = index.checked_sub(1) {
                sequence.set_current_index(target);
            }
            sequence.len()
        };

        if index >= known {
            tracing::debug!(index, known, "card not rendered yet, loading more");
            let weak = Rc::downgrade(self);
            self.gate.on_loaded_once(move || {
                if let Some(player) = weak.upgrade() {
                    tracing::debug!(len = player.len(), "data loaded, retrying jump");
                    player.play(index);
                }
            });
            self.gate.load();
        } else {
            self.toggle_playback();
        }
    }

    /// Steps forward and toggles playback, requesting more cards at the end.
    ///
    /// The load is fire-and-forget; playback is toggled right away.
    pub fn next(&self) {
        let reached_end = {
            let mut sequence = self.sequence.borrow_mut();
            sequence.next();
            sequence
                .last_index()
                .is_some_and(|last| sequence.current_index() == Some(last))
        };
        if reached_end {
            tracing::debug!("reached last known card");
            self.gate.load();
        }
        self.toggle_playback();
    }

    /// Steps back and toggles playback.
    pub fn prev(&self) {
        self.sequence.borrow_mut().prev();
        self.toggle_playback();
    }

    /// Clicks the current card, if there is one.
    pub fn toggle_playback(&self) {
        let current = self.sequence.borrow().current().cloned();
        match current {
            Some(card) => card.activate(),
            None => tracing::debug!(index = ?self.current_index(), "no card under cursor"),
        }
    }

    /// Requests more cards without moving the cursor.
    pub fn load_more(&self) {
        self.gate.load();
    }

    fn bind_trigger(&self, trigger: &D::Element, position: usize) {
        let sequence = Rc::downgrade(&self.sequence);
        self.document.set_onclick(
            trigger,
            Box::new(move || {
                let Some(sequence) = sequence.upgrade() else {
                    return;
                };
                let Ok(mut sequence) = sequence.try_borrow_mut() else {
                    tracing::debug!(position, "sequence busy, ignoring card click");
                    return;
                };
                sequence.set_current_index(position);
            }),
        );
    }
}

impl<D: Document> fmt::Debug for PlaylistController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistController")
            .field("selectors", &self.selectors)
            .field("len", &self.len())
            .field("current_index", &self.current_index())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::feed::FeedSimulator;
    use crate::dom::memory::MemoryDocument;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawn;

    struct Harness {
        feed: FeedSimulator,
        pool: LocalPool,
        player: Rc<PlaylistController<MemoryDocument>>,
    }

    impl Harness {
        fn new(initial: usize, page_size: usize) -> Self {
            let document = Rc::new(MemoryDocument::new());
            let feed = FeedSimulator::new(Rc::clone(&document), initial, page_size);
            Self::with_feed(feed)
        }

        fn with_feed(feed: FeedSimulator) -> Self {
            let document = Rc::clone(feed.document());
            let pool = LocalPool::new();
            let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());
            let gate = Rc::new(LoadGate::new(Rc::clone(&document), spawner, "main button"));
            let player = PlaylistController::new(
                document,
                CardSelectors::new("#cards-container > div", "[role=\"button\"]"),
                gate,
            );
            Self { feed, pool, player }
        }

        fn settle(&mut self) {
            self.feed.settle();
            self.pool.run_until_stalled();
        }

        fn load_clicks(&self) -> usize {
            let button = self.feed.load_more_button();
            self.feed
                .document()
                .click_log()
                .iter()
                .filter(|node| **node == button)
                .count()
        }
    }

    #[test]
    fn construction_discovers_cards() {
        let harness = Harness::new(4, 2);
        assert_eq!(harness.player.len(), 4);
        assert_eq!(harness.player.current_index(), Some(0));
    }

    #[test]
    fn next_requests_more_cards_only_on_the_last_card() {
        let harness = Harness::new(5, 5);
        harness.player.set_current_index(2);

        harness.player.next();
        assert_eq!(harness.player.current_index(), Some(3));
        assert_eq!(harness.load_clicks(), 0);
        assert_eq!(harness.feed.now_playing(), Some(3));

        harness.player.next();
        assert_eq!(harness.player.current_index(), Some(4));
        assert_eq!(harness.load_clicks(), 1);
        assert_eq!(harness.feed.now_playing(), Some(4));
    }

    #[test]
    fn next_at_end_extends_the_playlist_after_the_load() {
        let mut harness = Harness::new(2, 3);
        harness.player.next();
        assert!(harness.feed.is_busy());

        harness.settle();
        assert_eq!(harness.player.len(), 5);

        harness.player.next();
        assert_eq!(harness.player.current_index(), Some(2));
        assert_eq!(harness.feed.now_playing(), Some(2));
    }

    #[test]
    fn play_beyond_known_cards_loads_then_retries() {
        let mut harness = Harness::new(3, 5);

        harness.player.play(7);
        assert_eq!(harness.player.current_index(), Some(0));
        assert_eq!(harness.load_clicks(), 1);
        assert_eq!(harness.feed.activations(), 0);

        harness.settle();
        assert_eq!(harness.player.len(), 8);
        assert_eq!(harness.player.current_index(), Some(6));
        assert_eq!(harness.feed.now_playing(), Some(6));
        assert_eq!(harness.load_clicks(), 1);
    }

    #[test]
    fn play_keeps_loading_until_the_card_exists() {
        let mut harness = Harness::new(1, 2);
        harness.player.play(6);

        let mut cycles = 0;
        while harness.feed.is_busy() {
            harness.settle();
            cycles += 1;
        }

        assert_eq!(cycles, 3);
        assert_eq!(harness.player.len(), 7);
        assert_eq!(harness.player.current_index(), Some(5));
        assert_eq!(harness.feed.now_playing(), Some(5));
    }

    #[test]
    fn play_moves_to_the_previous_position() {
        let harness = Harness::new(5, 1);
        harness.player.play(2);
        assert_eq!(harness.player.current_index(), Some(1));
        assert_eq!(harness.feed.now_playing(), Some(1));
        assert_eq!(harness.load_clicks(), 0);
    }

    #[test]
    fn play_of_the_card_count_still_loads() {
        let harness = Harness::new(3, 1);
        harness.player.play(3);
        assert_eq!(harness.player.current_index(), Some(2));
        assert_eq!(harness.load_clicks(), 1);
        assert_eq!(harness.feed.activations(), 0);
    }

    #[test]
    fn play_zero_keeps_cursor_and_toggles() {
        let harness = Harness::new(3, 1);
        harness.player.set_current_index(2);
        harness.player.play(0);
        assert_eq!(harness.player.current_index(), Some(2));
        assert_eq!(harness.feed.now_playing(), Some(2));
    }

    #[test]
    fn prev_clamps_at_first_card_and_toggles() {
        let harness = Harness::new(3, 1);
        harness.player.set_current_index(1);
        harness.player.prev();
        assert_eq!(harness.player.current_index(), Some(0));
        assert_eq!(harness.feed.now_playing(), Some(0));

        harness.player.prev();
        assert_eq!(harness.player.current_index(), Some(0));
        assert_eq!(harness.feed.now_playing(), None);
    }

    #[test]
    fn empty_playlist_operations_are_no_ops() {
        let mut harness = Harness::new(0, 0);
        harness.player.toggle_playback();
        harness.player.prev();
        harness.player.next();
        harness.settle();
        assert!(harness.player.is_empty());
        assert_eq!(harness.feed.activations(), 0);
    }

    #[test]
    fn rebuild_skips_containers_without_trigger() {
        let document = Rc::new(MemoryDocument::new());
        let feed = FeedSimulator::new(Rc::clone(&document), 2, 2);
        feed.push_placeholder();
        let mut harness = Harness::with_feed(feed);

        harness.player.load_more();
        harness.settle();

        assert_eq!(document.query_selector_all("#cards-container > div").len(), 5);
        assert_eq!(harness.player.len(), 4);

        harness.player.set_current_index(2);
        harness.player.toggle_playback();
        assert_eq!(harness.feed.now_playing(), Some(2));
        assert_eq!(harness.feed.triggers()[2], document.click_log()[document.click_log().len() - 1]);
    }

    #[test]
    fn clicking_a_card_moves_the_cursor() {
        let mut harness = Harness::new(3, 3);
        harness.feed.click_card(2);
        assert_eq!(harness.player.current_index(), Some(2));

        harness.player.load_more();
        harness.settle();
        harness.feed.click_card(4);
        assert_eq!(harness.player.current_index(), Some(4));
        harness.feed.click_card(1);
        assert_eq!(harness.player.current_index(), Some(1));
    }

    #[test]
    fn dropped_controller_ignores_later_loads() {
        let mut harness = Harness::new(2, 2);
        let gate = Rc::clone(harness.player.gate());
        harness.player.play(5);
        drop(std::mem::replace(
            &mut harness.player,
            PlaylistController::new(
                Rc::clone(harness.feed.document()),
                CardSelectors::new("#nothing", "[role]"),
                gate,
            ),
        ));
        harness.settle();
        assert!(harness.player.is_empty());
        assert_eq!(harness.feed.activations(), 0);
    }
}
