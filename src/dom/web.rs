//! `web-sys` implementation of [`Document`].
//!
//! Rust callbacks are handed to the browser as `Closure`s owned by [`WebDocument`].
//! A closure must outlive every JS call into it, including the one running when it
//! is detached (a one-shot listener removes itself from inside its own invocation),
//! so detached closures are dropped from a later microtask rather than in place.

use super::{
    replace_handler, AttributeMutation, AttributeObserver, ClickInit, ClickListener, Document,
    ListenerId, Observation, ObserverId, ScrollBehavior, ScrollBlock, ScrollIntoView,
};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use js_sys::Array;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlButtonElement, HtmlElement, MouseEvent, MouseEventInit, MutationObserver,
    MutationObserverInit, MutationRecord, ScrollIntoViewOptions, ScrollLogicalPosition,
};

type ClickClosure = Closure<dyn FnMut()>;
type MutationClosure = Closure<dyn FnMut(Array, MutationObserver)>;

#[derive(Default)]
struct Handles {
    next_id: u64,
    listeners: HashMap<u64, (Element, ClickClosure)>,
    onclick: Vec<(HtmlElement, ClickClosure)>,
    observers: HashMap<u64, (MutationObserver, MutationClosure)>,
}

impl Handles {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// The live page.
pub struct WebDocument {
    document: web_sys::Document,
    window: Option<web_sys::Window>,
    handles: Rc<RefCell<Handles>>,
}

impl WebDocument {
    #[must_use]
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            window: document.default_view(),
            document,
            handles: Rc::new(RefCell::new(Handles::default())),
        }
    }

    /// The document of the global window, if running in a page.
    #[must_use]
    pub fn from_window() -> Option<Self> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
    }

    #[must_use]
    pub const fn raw(&self) -> &web_sys::Document {
        &self.document
    }
}

impl fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handles = self.handles.borrow();
        f.debug_struct("WebDocument")
            .field("listeners", &handles.listeners.len())
            .field("onclick", &handles.onclick.len())
            .field("observers", &handles.observers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for WebDocument {
    fn drop(&mut self) {
        let Ok(mut handles) = self.handles.try_borrow_mut() else {
            return;
        };
        for (_, (element, closure)) in handles.listeners.drain() {
            let _ = element
                .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            retire(closure);
        }
        for (element, closure) in handles.onclick.drain(..) {
            element.set_onclick(None);
            retire(closure);
        }
        for (_, (observer, closure)) in handles.observers.drain() {
            observer.disconnect();
            retire(closure);
        }
    }
}

/// Drops `handle` after the current JS call stack has unwound.
fn retire<T: 'static>(handle: T) {
    wasm_bindgen_futures::spawn_local(async move {
        drop(handle);
    });
}

impl Document for WebDocument {
    type Element = Element;

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).unwrap_or_else(|err| {
            tracing::warn!(selector, error = ?err, "invalid selector");
            None
        })
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(selector, error = ?err, "invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_selector_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).unwrap_or_else(|err| {
            tracing::warn!(selector, error = ?err, "invalid selector");
            None
        })
    }

    fn is_disabled(&self, element: &Element) -> bool {
        element
            .dyn_ref::<HtmlButtonElement>()
            .map_or_else(|| element.has_attribute("disabled"), HtmlButtonElement::disabled)
    }

    fn scroll_into_view(&self, element: &Element, options: ScrollIntoView) {
        let js_options = ScrollIntoViewOptions::new();
        js_options.set_behavior(match options.behavior {
            ScrollBehavior::Auto => web_sys::ScrollBehavior::Auto,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        js_options.set_block(match options.block {
            ScrollBlock::Start => ScrollLogicalPosition::Start,
            ScrollBlock::Center => ScrollLogicalPosition::Center,
            ScrollBlock::End => ScrollLogicalPosition::End,
            ScrollBlock::Nearest => ScrollLogicalPosition::Nearest,
        });
        element.scroll_into_view_with_scroll_into_view_options(&js_options);
    }

    fn dispatch_click(&self, element: &Element, init: ClickInit) {
        let js_init = MouseEventInit::new();
        js_init.set_bubbles(init.bubbles);
        js_init.set_cancelable(init.cancelable);
        js_init.set_view(self.window.as_ref());

        match MouseEvent::new_with_mouse_event_init_dict("click", &js_init) {
            Ok(event) => {
                if let Err(err) = element.dispatch_event(&event) {
                    tracing::warn!(error = ?err, "click dispatch failed");
                }
            }
            Err(err) => tracing::warn!(error = ?err, "could not create click event"),
        }
    }

    fn add_click_listener(&self, element: &Element, listener: ClickListener) -> ListenerId {
        let closure = Closure::wrap(listener);
        if let Err(err) =
            element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(error = ?err, "could not add click listener");
        }

        let mut handles = self.handles.borrow_mut();
        let id = handles.allocate_id();
        handles.listeners.insert(id, (element.clone(), closure));
        ListenerId(id)
    }

    fn remove_click_listener(&self, element: &Element, id: ListenerId) {
        let removed = self.handles.borrow_mut().listeners.remove(&id.0);
        let Some((registered_on, closure)) = removed else {
            return;
        };
        if registered_on != *element {
            tracing::debug!(listener = id.0, "listener registered on another element");
        }
        let _ = registered_on
            .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        retire(closure);
    }

    fn set_onclick(&self, element: &Element, handler: ClickListener) {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            tracing::debug!(element = ?element, "onclick on a non-HTML element, ignoring");
            return;
        };
        let closure = Closure::wrap(handler);
        html.set_onclick(Some(closure.as_ref().unchecked_ref()));

        let displaced = replace_handler(
            &mut self.handles.borrow_mut().onclick,
            html.clone(),
            closure,
            |held| held.is_connected(),
        );
        if !displaced.is_empty() {
            tracing::trace!(count = displaced.len(), "retiring onclick handlers");
        }
        for previous in displaced {
            retire(previous);
        }
    }

    fn observe_attributes(&self, element: &Element, observer: AttributeObserver) -> ObserverId {
        let mut handles = self.handles.borrow_mut();
        let id = handles.allocate_id();
        let registry: Weak<RefCell<Handles>> = Rc::downgrade(&self.handles);
        let mut observer = observer;

        let closure: MutationClosure = Closure::wrap(Box::new(
            move |records: Array, js_observer: MutationObserver| {
                for record in records.iter() {
                    let Ok(record) = record.dyn_into::<MutationRecord>() else {
                        continue;
                    };
                    let Some(name) = record.attribute_name() else {
                        continue;
                    };
                    if observer(&AttributeMutation::new(name)) == Observation::Disconnect {
                        js_observer.disconnect();
                        if let Some(handles) = registry.upgrade() {
                            let entry = handles.borrow_mut().observers.remove(&id);
                            if let Some(entry) = entry {
                                retire(entry);
                            }
                        }
                        break;
                    }
                }
            },
        ));

        let js_observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(js_observer) => js_observer,
            Err(err) => {
                tracing::warn!(error = ?err, "could not create mutation observer");
                return ObserverId(id);
            }
        };
        let options = MutationObserverInit::new();
        options.set_attributes(true);
        if let Err(err) = js_observer.observe_with_options(element, &options) {
            tracing::warn!(error = ?err, "could not observe element");
            return ObserverId(id);
        }

        handles.observers.insert(id, (js_observer, closure));
        ObserverId(id)
    }
}

/// Runs futures on the browser's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
