//! Scripted stand-in for the component that renders cards.
//!
//! In a browser, clicking the load-more button makes the page fetch the next batch,
//! disable the button while the request is in flight, append cards and re-enable the
//! button. [`FeedSimulator`] plays that role on a [`MemoryDocument`] so the whole
//! playlist can run natively:
//!
//! ```text
//! main
//! ├── div#cards-container
//! │   ├── div.card[data-index=0] > div[role=button]
//! │   └── ...
//! └── button            ← load more
//! ```
//!
//! Loads are split in two steps so callers control timing: a click marks the button
//! busy and queues a page, [`settle`](FeedSimulator::settle) renders queued pages and
//! clears the flag. Clicks on a busy button are ignored.

use super::memory::{MemoryDocument, NodeId};
use super::{ClickInit, Document};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct FeedState {
    next_index: usize,
    page_size: usize,
    limit: Option<usize>,
    pending_pages: usize,
    triggers: Vec<NodeId>,
    now_playing: Option<usize>,
    activations: usize,
}

/// Card list driver over a [`MemoryDocument`].
#[derive(Debug)]
pub struct FeedSimulator {
    document: Rc<MemoryDocument>,
    container: NodeId,
    load_more: NodeId,
    state: Rc<RefCell<FeedState>>,
}

impl FeedSimulator {
    /// Builds the page skeleton with `initial` cards; each load appends `page_size`.
    pub fn new(document: Rc<MemoryDocument>, initial: usize, page_size: usize) -> Self {
        let main = document.create_element(document.root(), "main");
        let container = document.create_element_with(main, "div", &[("id", "cards-container")]);
        let load_more = document.create_element_with(main, "button", &[("type", "button")]);

        let state = Rc::new(RefCell::new(FeedState {
            page_size,
            ..FeedState::default()
        }));

        let feed = Self {
            document,
            container,
            load_more,
            state,
        };
        feed.install_load_listener();
        feed.render_cards(initial);
        feed
    }

    /// Stops producing cards once `limit` have been rendered in total.
    #[must_use]
    pub fn with_limit(self, limit: usize) -> Self {
        self.state.borrow_mut().limit = Some(limit);
        self
    }

    #[must_use]
    pub fn document(&self) -> &Rc<MemoryDocument> {
        &self.document
    }

    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub const fn load_more_button(&self) -> NodeId {
        self.load_more
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.document.is_disabled(&self.load_more)
    }

    /// Number of playable cards currently rendered.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.state.borrow().triggers.len()
    }

    /// Play triggers in document order.
    #[must_use]
    pub fn triggers(&self) -> Vec<NodeId> {
        self.state.borrow().triggers.clone()
    }

    /// Position of the playing card among playable cards.
    #[must_use]
    pub fn now_playing(&self) -> Option<usize> {
        self.state.borrow().now_playing
    }

    /// Total clicks received by card triggers.
    #[must_use]
    pub fn activations(&self) -> usize {
        self.state.borrow().activations
    }

    /// Appends a card-shaped container without a play trigger, like an ad slot.
    pub fn push_placeholder(&self) -> NodeId {
        self.document
            .create_element_with(self.container, "div", &[("class", "card placeholder")])
    }

    /// Renders every queued page and clears the busy flag.
    ///
    /// Returns the number of cards added. A no-op when nothing is pending.
    pub fn settle(&self) -> usize {
        let pages = std::mem::take(&mut self.state.borrow_mut().pending_pages);
        if pages == 0 {
            return 0;
        }
        let page_size = self.state.borrow().page_size;
        let added = self.render_cards(pages * page_size);
        tracing::debug!(pages, added, "feed settled");
        self.document.set_disabled(self.load_more, false);
        added
    }

    /// Simulates the user clicking a card's trigger directly.
    pub fn click_card(&self, position: usize) {
        let trigger = self.state.borrow().triggers.get(position).copied();
        if let Some(trigger) = trigger {
            self.document.dispatch_click(&trigger, ClickInit::default());
        }
    }

    fn install_load_listener(&self) {
        let document: Weak<MemoryDocument> = Rc::downgrade(&self.document);
        let state = Rc::clone(&self.state);
        let button = self.load_more;
        self.document.add_click_listener(
            &button,
            Box::new(move || {
                let Some(document) = document.upgrade() else {
                    return;
                };
                if document.is_disabled(&button) {
                    tracing::debug!("load requested while busy, ignoring");
                    return;
                }
                state.borrow_mut().pending_pages += 1;
                document.set_disabled(button, true);
            }),
        );
    }

    fn render_cards(&self, count: usize) -> usize {
        let mut added = 0;
        for _ in 0..count {
            let index = {
                let state = self.state.borrow();
                if state.limit.is_some_and(|limit| state.next_index >= limit) {
                    break;
                }
                state.next_index
            };

            let label = index.to_string();
            let card = self.document.create_element_with(
                self.container,
                "div",
                &[("class", "card"), ("data-index", label.as_str())],
            );
            let trigger = self
                .document
                .create_element_with(card, "div", &[("role", "button")]);
            self.install_trigger_listener(trigger);

            let mut state = self.state.borrow_mut();
            state.next_index += 1;
            state.triggers.push(trigger);
            added += 1;
        }
        added
    }

    fn install_trigger_listener(&self, trigger: NodeId) {
        let state = Rc::clone(&self.state);
        self.document.add_click_listener(
            &trigger,
            Box::new(move || {
                let mut state = state.borrow_mut();
                state.activations += 1;
                let Some(position) = state.triggers.iter().position(|t| *t == trigger) else {
                    return;
                };
                state.now_playing = if state.now_playing == Some(position) {
                    None
                } else {
                    Some(position)
                };
            }),
        );
    }
}
