//! Document abstraction the playlist drives.
//!
//! The page is an external system: something else renders the cards, fetches more
//! of them and flips the load-more button's `disabled` flag. scrollplay only needs
//! to query elements, click them, scroll them into view and watch attribute changes.
//! [`Document`] captures exactly that surface.
//!
//! # Implementations
//!
//! - [`memory::MemoryDocument`]: in-process arena tree with a selector subset, used by
//!   the simulator binary and the tests
//! - [`feed::FeedSimulator`]: scripted stand-in for the component that renders cards
//! - `web::WebDocument`: `web-sys` bindings (wasm32 only)
//!
//! # Threading
//!
//! Everything here is single-threaded. Callbacks are boxed `FnMut` closures without
//! `Send` bounds and implementations must tolerate callbacks that call back into the
//! document (for example an observer reading `is_disabled`).

pub mod feed;
pub mod memory;

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::fmt;

/// Identifies a click listener registered with [`Document::add_click_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Identifies an attribute observer registered with [`Document::observe_attributes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Scroll animation requested by [`Document::scroll_into_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    Auto,
    #[default]
    Smooth,
}

/// Vertical alignment requested by [`Document::scroll_into_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

/// Options for bringing an element into the viewport.
///
/// The default is what cards use: smooth motion, vertically centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollIntoView {
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

/// Options for a synthetic primary-button click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickInit {
    pub bubbles: bool,
    pub cancelable: bool,
}

impl Default for ClickInit {
    fn default() -> Self {
        Self {
            bubbles: true,
            cancelable: true,
        }
    }
}

/// Change record delivered to attribute observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMutation {
    /// Name of the attribute that was set or removed.
    pub attribute_name: String,
}

impl AttributeMutation {
    #[must_use]
    pub fn new(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
        }
    }
}

/// Returned by attribute observers to keep or drop their subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Continue,
    Disconnect,
}

/// Boxed click handler.
pub type ClickListener = Box<dyn FnMut()>;

/// Boxed attribute observer.
pub type AttributeObserver = Box<dyn FnMut(&AttributeMutation) -> Observation>;

/// The queryable, observable, clickable page.
///
/// Methods take `&self`; implementations use interior mutability. None of them may
/// panic on missing elements or invalid selectors: they return empty results and
/// log instead.
pub trait Document: 'static {
    /// Handle to one element. Cheap to clone, compared by identity.
    type Element: Clone + PartialEq + fmt::Debug + 'static;

    /// First element in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// All elements in document order matching `selector`.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

    /// First descendant of `scope` matching `selector`.
    fn query_selector_within(&self, scope: &Self::Element, selector: &str) -> Option<Self::Element>;

    /// Current value of the element's busy/disabled flag.
    fn is_disabled(&self, element: &Self::Element) -> bool;

    /// Fire-and-forget request to bring `element` into view.
    fn scroll_into_view(&self, element: &Self::Element, options: ScrollIntoView);

    /// Dispatches a synthetic primary-button click on `element`.
    fn dispatch_click(&self, element: &Self::Element, init: ClickInit);

    /// Adds a click listener; listeners accumulate.
    fn add_click_listener(&self, element: &Self::Element, listener: ClickListener) -> ListenerId;

    /// Removes a click listener. Unknown ids are ignored.
    fn remove_click_listener(&self, element: &Self::Element, id: ListenerId);

    /// Sets the element's single `onclick` handler, replacing any previous one.
    fn set_onclick(&self, element: &Self::Element, handler: ClickListener);

    /// Subscribes to attribute changes on `element` until the observer returns
    /// [`Observation::Disconnect`].
    fn observe_attributes(&self, element: &Self::Element, observer: AttributeObserver) -> ObserverId;
}

/// Stores `handler` as the single handler for `element`.
///
/// Returns the handlers that were displaced: the element's previous one, plus any
/// held for elements `is_live` rejects (detached from the page).
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn replace_handler<E: PartialEq, H>(
    slots: &mut Vec<(E, H)>,
    element: E,
    handler: H,
    is_live: impl Fn(&E) -> bool,
) -> Vec<H> {
    let mut displaced = Vec::new();
    let mut kept = Vec::with_capacity(slots.len() + 1);
    for (slot, held) in slots.drain(..) {
        if slot == element || !is_live(&slot) {
            displaced.push(held);
        } else {
            kept.push((slot, held));
        }
    }
    kept.push((element, handler));
    *slots = kept;
    displaced
}
