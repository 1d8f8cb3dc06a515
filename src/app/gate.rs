//! Load-more trigger and completion notifications.
//!
//! The page loads more cards when its load-more button is clicked. While the request
//! is in flight the button is disabled; re-enabling it is the only completion signal.
//! [`LoadGate`] clicks that button and turns the disabled → enabled transition into
//! callbacks.
//!
//! # Registration lifecycle
//!
//! ```text
//! Idle ──click──▶ WaitingForClear ──`disabled` mutation, flag false──▶ Fired
//! ```
//!
//! - Repeating: at most one at a time. Every click starts a new wait; when a wait
//!   resolves, the repeating callback registered *at that moment* runs.
//! - Once: any number. The first click detaches the registration before waiting, so
//!   it can never fire twice.
//!
//! # Known gap
//!
//! Waiting is purely change-driven. A click that never causes a `disabled` mutation
//! (the page ignored it, or finished before observation started) leaves the wait
//! pending forever. The flag is not polled at registration time, so a
//! click on an idle button does not count as a completed load.

use crate::dom::{AttributeMutation, ClickInit, Document, ListenerId, Observation};
use futures::channel::oneshot;
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

struct RepeatingRegistration {
    listener: ListenerId,
    callback: Rc<dyn Fn()>,
}

type RepeatingSlot = RefCell<Option<RepeatingRegistration>>;
type OnceCallback = Box<dyn FnOnce()>;

/// Clicks the load-more trigger and reports when loading finished.
///
/// One instance exists per [`Session`](crate::app::Session); controllers receive it
/// by `Rc`.
pub struct LoadGate<D: Document> {
    document: Rc<D>,
    spawner: Rc<dyn LocalSpawn>,
    trigger: Option<D::Element>,
    repeating: Rc<RepeatingSlot>,
}

impl<D: Document> LoadGate<D> {
    /// Resolves the trigger from `selector`.
    ///
    /// A missing trigger is logged; every operation then becomes a no-op.
    pub fn new(document: Rc<D>, spawner: Rc<dyn LocalSpawn>, selector: &str) -> Self {
        let trigger = document.query_selector(selector);
        match &trigger {
            Some(element) => tracing::debug!(selector = %selector, trigger = ?element, "load-more trigger resolved"),
            None => tracing::warn!(selector = %selector, "load-more trigger not found, loading disabled"),
        }
        Self {
            document,
            spawner,
            trigger,
            repeating: Rc::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub fn trigger(&self) -> Option<&D::Element> {
        self.trigger.as_ref()
    }

    /// Clicks the load-more trigger.
    pub fn load(&self) {
        let Some(trigger) = &self.trigger else {
            tracing::debug!("load requested without a trigger");
            return;
        };
        tracing::debug!("requesting more cards");
        self.document.dispatch_click(trigger, ClickInit::default());
    }

    /// Installs the repeating loaded-callback, detaching the previous one.
    pub fn on_loaded_repeating(&self, callback: impl Fn() + 'static) {
        let Some(trigger) = self.trigger.clone() else {
            return;
        };

        let previous = self.repeating.borrow_mut().take();
        if let Some(previous) = previous {
            tracing::debug!(listener = previous.listener.0, "replacing repeating loaded-callback");
            self.document.remove_click_listener(&trigger, previous.listener);
        }

        let document = Rc::downgrade(&self.document);
        let spawner = Rc::clone(&self.spawner);
        let slot: Weak<RepeatingSlot> = Rc::downgrade(&self.repeating);
        let watched = trigger.clone();

        let listener = self.document.add_click_listener(
            &trigger,
            Box::new(move || {
                let Some(document) = document.upgrade() else {
                    return;
                };
                let cleared = wait_for_clear(&document, &watched);
                let slot = slot.clone();
                spawn_wait(spawner.as_ref(), async move {
                    if cleared.await.is_err() {
                        return;
                    }
                    let callback = slot
                        .upgrade()
                        .and_then(|slot| slot.borrow().as_ref().map(|r| Rc::clone(&r.callback)));
                    if let Some(callback) = callback {
                        callback();
                    }
                });
            }),
        );

        *self.repeating.borrow_mut() = Some(RepeatingRegistration {
            listener,
            callback: Rc::new(callback),
        });
    }

    /// Registers a callback for the next completed load only.
    pub fn on_loaded_once(&self, callback: impl FnOnce() + 'static) {
        let Some(trigger) = self.trigger.clone() else {
            return;
        };

        let pending: RefCell<Option<OnceCallback>> = RefCell::new(Some(Box::new(callback)));
        let own_listener: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let document = Rc::downgrade(&self.document);
        let spawner = Rc::clone(&self.spawner);
        let listener_slot = Rc::clone(&own_listener);
        let watched = trigger.clone();

        let listener = self.document.add_click_listener(
            &trigger,
            Box::new(move || {
                let Some(callback) = pending.borrow_mut().take() else {
                    return;
                };
                let Some(document) = document.upgrade() else {
                    return;
                };
                if let Some(id) = listener_slot.get() {
                    document.remove_click_listener(&watched, id);
                }
                let cleared = wait_for_clear(&document, &watched);
                spawn_wait(spawner.as_ref(), async move {
                    if cleared.await.is_ok() {
                        callback();
                    }
                });
            }),
        );
        own_listener.set(Some(listener));
    }
}

impl<D: Document> fmt::Debug for LoadGate<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadGate")
            .field("trigger", &self.trigger)
            .field("has_repeating", &self.repeating.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// Resolves once a `disabled` mutation is observed with the flag cleared.
///
/// The observer is attached before this returns, so mutations caused by the rest of
/// the current click dispatch are seen. The receiver errors if the document drops
/// the observer first.
fn wait_for_clear<D: Document>(document: &Rc<D>, trigger: &D::Element) -> oneshot::Receiver<()> {
    let (sender, receiver) = oneshot::channel();
    let mut sender = Some(sender);
    let weak = Rc::downgrade(document);
    let watched = trigger.clone();

    document.observe_attributes(
        trigger,
        Box::new(move |mutation: &AttributeMutation| {
            if mutation.attribute_name != "disabled" {
                return Observation::Continue;
            }
            let cleared = weak.upgrade().is_some_and(|doc| !doc.is_disabled(&watched));
            if !cleared {
                return Observation::Continue;
            }
            if let Some(sender) = sender.take() {
                let _ = sender.send(());
            }
            Observation::Disconnect
        }),
    );
    receiver
}

fn spawn_wait(spawner: &dyn LocalSpawn, task: impl Future<Output = ()> + 'static) {
    if let Err(error) = spawner.spawn_local(task) {
        tracing::warn!(error = %error, "failed to schedule loaded-callback");
    }
}
