//! Playable card handle.

use crate::dom::{ClickInit, Document, ScrollIntoView};
use std::fmt;
use std::rc::Rc;

/// One card's play/pause trigger.
///
/// Cards are recreated on every rebuild; they carry no state beyond the trigger
/// handle.
pub struct Card<D: Document> {
    document: Rc<D>,
    trigger: D::Element,
}

impl<D: Document> Card<D> {
    #[must_use]
    pub fn new(document: Rc<D>, trigger: D::Element) -> Self {
        Self { document, trigger }
    }

    #[must_use]
    pub fn trigger(&self) -> &D::Element {
        &self.trigger
    }

    /// Scrolls the trigger to the middle of the viewport and clicks it.
    ///
    /// The scroll is not awaited; the click is dispatched immediately and bubbles.
    pub fn activate(&self) {
        tracing::debug!(trigger = ?self.trigger, "activating card");
        self.document
            .scroll_into_view(&self.trigger, ScrollIntoView::default());
        self.document
            .dispatch_click(&self.trigger, ClickInit::default());
    }
}

impl<D: Document> Clone for Card<D> {
    fn clone(&self) -> Self {
        Self {
            document: Rc::clone(&self.document),
            trigger: self.trigger.clone(),
        }
    }
}

impl<D: Document> fmt::Debug for Card<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryDocument;
    use crate::dom::{ScrollBehavior, ScrollBlock};
    use std::cell::Cell;

    #[test]
    fn activate_scrolls_then_clicks_with_bubbling() {
        let document = Rc::new(MemoryDocument::new());
        let card = document.create_element(document.root(), "div");
        let trigger = document.create_element(card, "span");

        let bubbled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&bubbled);
        document.add_click_listener(&card, Box::new(move || flag.set(true)));

        Card::new(Rc::clone(&document), trigger).activate();

        let scrolls = document.scroll_log();
        assert_eq!(scrolls.len(), 1);
        assert_eq!(scrolls[0].0, trigger);
        assert_eq!(scrolls[0].1.behavior, ScrollBehavior::Smooth);
        assert_eq!(scrolls[0].1.block, ScrollBlock::Center);
        assert_eq!(document.click_log(), vec![trigger]);
        assert!(bubbled.get());
    }
}
