//! In-process document used by the simulator and the tests.
//!
//! [`MemoryDocument`] stores elements in an arena indexed by [`NodeId`] and
//! implements [`Document`] with the same observable behavior the playlist relies on
//! in a browser:
//!
//! - Clicks bubble from the target through its ancestors. A listener removed while a
//!   click is being dispatched is skipped; one added during dispatch waits for the
//!   next click.
//! - `set_attribute` always produces a mutation record; `remove_attribute` only
//!   when the attribute was present. Records are delivered synchronously.
//! - Selectors support tag names, `*`, `#id`, `.class`, `[attr]` and
//!   `[attr=value]` (quoted or bare) compounds joined by descendant (whitespace) or
//!   child (`>`) combinators. Anything else is rejected and matches nothing.

use super::{
    AttributeMutation, AttributeObserver, ClickInit, ClickListener, Document, ListenerId,
    Observation, ObserverId, ScrollIntoView,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_element: bool,
    tag: String,
    attributes: BTreeMap<String, String>,
}

type SharedListener = Rc<RefCell<ClickListener>>;
type SharedObserver = Rc<RefCell<AttributeObserver>>;

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    listener: SharedListener,
}

struct ObserverEntry {
    id: ObserverId,
    node: NodeId,
    observer: SharedObserver,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
    onclick: HashMap<NodeId, SharedListener>,
    observers: Vec<ObserverEntry>,
}

impl Registry {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Arena-backed [`Document`] implementation.
pub struct MemoryDocument {
    nodes: RefCell<Vec<Node>>,
    registry: RefCell<Registry>,
    clicks: RefCell<Vec<NodeId>>,
    scrolls: RefCell<Vec<(NodeId, ScrollIntoView)>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.nodes.borrow().len())
            .field("clicks", &self.clicks.borrow().len())
            .finish_non_exhaustive()
    }
}

impl MemoryDocument {
    /// Creates a document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            is_element: false,
            tag: "#document".to_string(),
            attributes: BTreeMap::new(),
        };
        Self {
            nodes: RefCell::new(vec![root]),
            registry: RefCell::new(Registry::default()),
            clicks: RefCell::new(Vec::new()),
            scrolls: RefCell::new(Vec::new()),
        }
    }

    /// The document root. Never matched by selectors.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a new element under `parent`.
    pub fn create_element(&self, parent: NodeId, tag: &str) -> NodeId {
        self.create_element_with(parent, tag, &[])
    }

    /// Appends a new element under `parent` with initial attributes.
    ///
    /// Initial attributes do not produce mutation records.
    pub fn create_element_with(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            is_element: true,
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
        });
        if let Some(parent_node) = nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(node.0)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    /// Sets an attribute and notifies observers of `node`.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let Some(target) = nodes.get_mut(node.0) else {
                return;
            };
            target.attributes.insert(name.to_string(), value.to_string());
        }
        self.notify_observers(node, name);
    }

    /// Removes an attribute; observers are notified only if it was present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        let removed = self
            .nodes
            .borrow_mut()
            .get_mut(node.0)
            .and_then(|target| target.attributes.remove(name))
            .is_some();
        if removed {
            self.notify_observers(node, name);
        }
    }

    /// Toggles the boolean `disabled` attribute.
    pub fn set_disabled(&self, node: NodeId, disabled: bool) {
        if disabled {
            self.set_attribute(node, "disabled", "");
        } else {
            self.remove_attribute(node, "disabled");
        }
    }

    /// Every element `dispatch_click` was called on, oldest first.
    #[must_use]
    pub fn click_log(&self) -> Vec<NodeId> {
        self.clicks.borrow().clone()
    }

    /// Every scroll request, oldest first.
    #[must_use]
    pub fn scroll_log(&self) -> Vec<(NodeId, ScrollIntoView)> {
        self.scrolls.borrow().clone()
    }

    /// Number of `add_click_listener` registrations still attached to `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.node == node)
            .count()
    }

    /// Number of attribute observers still attached to `node`.
    #[must_use]
    pub fn observer_count(&self, node: NodeId) -> usize {
        self.registry
            .borrow()
            .observers
            .iter()
            .filter(|entry| entry.node == node)
            .count()
    }

    fn notify_observers(&self, node: NodeId, name: &str) {
        let snapshot: Vec<(ObserverId, SharedObserver)> = self
            .registry
            .borrow()
            .observers
            .iter()
            .filter(|entry| entry.node == node)
            .map(|entry| (entry.id, Rc::clone(&entry.observer)))
            .collect();

        let mutation = AttributeMutation::new(name);
        for (id, observer) in snapshot {
            let still_observing = self.registry.borrow().observers.iter().any(|e| e.id == id);
            if !still_observing {
                continue;
            }
            let outcome = match observer.try_borrow_mut() {
                Ok(mut callback) => callback(&mutation),
                Err(_) => {
                    tracing::debug!(observer = id.0, "observer is already running, skipping record");
                    Observation::Continue
                }
            };
            if outcome == Observation::Disconnect {
                self.registry.borrow_mut().observers.retain(|e| e.id != id);
            }
        }
    }

    fn propagation_path(&self, target: NodeId, bubbles: bool) -> Vec<NodeId> {
        if !bubbles {
            return vec![target];
        }
        let nodes = self.nodes.borrow();
        let mut path = vec![target];
        let mut current = nodes.get(target.0).and_then(|n| n.parent);
        while let Some(node) = current {
            path.push(node);
            current = nodes.get(node.0).and_then(|n| n.parent);
        }
        path
    }

    fn run_handlers(&self, node: NodeId) {
        let (listeners, onclick): (Vec<(ListenerId, SharedListener)>, Option<SharedListener>) = {
            let registry = self.registry.borrow();
            (
                registry
                    .listeners
                    .iter()
                    .filter(|entry| entry.node == node)
                    .map(|entry| (entry.id, Rc::clone(&entry.listener)))
                    .collect(),
                registry.onclick.get(&node).cloned(),
            )
        };

        for (id, listener) in listeners {
            let still_attached = self.registry.borrow().listeners.iter().any(|e| e.id == id);
            if still_attached {
                Self::invoke(&listener);
            }
        }
        if let Some(handler) = onclick {
            Self::invoke(&handler);
        }
    }

    fn invoke(listener: &SharedListener) {
        match listener.try_borrow_mut() {
            Ok(mut callback) => callback(),
            Err(_) => tracing::debug!("click listener re-entered, skipping"),
        }
    }

    fn collect_matches(&self, scope: NodeId, selector: &Selector, first_only: bool) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut matches = Vec::new();
        let mut stack: Vec<NodeId> = nodes
            .get(scope.0)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(node) = stack.pop() {
            if selector.matches(&nodes, node) {
                matches.push(node);
                if first_only {
                    break;
                }
            }
            if let Some(n) = nodes.get(node.0) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        matches
    }

    fn query(&self, scope: NodeId, selector: &str, first_only: bool) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Some(parsed) => self.collect_matches(scope, &parsed, first_only),
            None => {
                tracing::warn!(selector = %selector, "unsupported selector, matching nothing");
                Vec::new()
            }
        }
    }
}

impl Document for MemoryDocument {
    type Element = NodeId;

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query(self.root(), selector, true).into_iter().next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query(self.root(), selector, false)
    }

    fn query_selector_within(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        self.query(*scope, selector, true).into_iter().next()
    }

    fn is_disabled(&self, element: &NodeId) -> bool {
        self.nodes
            .borrow()
            .get(element.0)
            .is_some_and(|n| n.attributes.contains_key("disabled"))
    }

    fn scroll_into_view(&self, element: &NodeId, options: ScrollIntoView) {
        self.scrolls.borrow_mut().push((*element, options));
    }

    fn dispatch_click(&self, element: &NodeId, init: ClickInit) {
        self.clicks.borrow_mut().push(*element);
        for node in self.propagation_path(*element, init.bubbles) {
            self.run_handlers(node);
        }
    }

    fn add_click_listener(&self, element: &NodeId, listener: ClickListener) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.allocate_id());
        registry.listeners.push(ListenerEntry {
            id,
            node: *element,
            listener: Rc::new(RefCell::new(listener)),
        });
        id
    }

    fn remove_click_listener(&self, element: &NodeId, id: ListenerId) {
        self.registry
            .borrow_mut()
            .listeners
            .retain(|entry| !(entry.id == id && entry.node == *element));
    }

    fn set_onclick(&self, element: &NodeId, handler: ClickListener) {
        self.registry
            .borrow_mut()
            .onclick
            .insert(*element, Rc::new(RefCell::new(handler)));
    }

    fn observe_attributes(&self, element: &NodeId, observer: AttributeObserver) -> ObserverId {
        let mut registry = self.registry.borrow_mut();
        let id = ObserverId(registry.allocate_id());
        registry.observers.push(ObserverEntry {
            id,
            node: *element,
            observer: Rc::new(RefCell::new(observer)),
        });
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if !node.is_element {
            return false;
        }
        if let Some(tag) = &self.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attributes.get("id") != Some(id) {
                return false;
            }
        }
        let classes = node.attributes.get("class").map_or("", String::as_str);
        if !self
            .classes
            .iter()
            .all(|wanted| classes.split_whitespace().any(|class| class == wanted))
        {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            None => node.attributes.contains_key(name),
            Some(expected) => node.attributes.get(name) == Some(expected),
        })
    }
}

/// Parsed complex selector; the combinator of the first step is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    steps: Vec<(Combinator, Compound)>,
}

impl Selector {
    fn parse(input: &str) -> Option<Self> {
        let mut chars = input.trim().chars().peekable();
        let mut steps = Vec::new();
        let mut pending_child = false;

        loop {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    chars.next();
                } else if c == '>' {
                    if pending_child || steps.is_empty() {
                        return None;
                    }
                    pending_child = true;
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().is_none() {
                break;
            }
            let compound = parse_compound(&mut chars)?;
            let combinator = if pending_child {
                Combinator::Child
            } else {
                Combinator::Descendant
            };
            steps.push((combinator, compound));
            pending_child = false;
        }

        if pending_child || steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }

    fn matches(&self, nodes: &[Node], node: NodeId) -> bool {
        self.matches_step(nodes, node, self.steps.len() - 1)
    }

    fn matches_step(&self, nodes: &[Node], node: NodeId, step: usize) -> bool {
        let Some(current) = nodes.get(node.0) else {
            return false;
        };
        let (combinator, compound) = &self.steps[step];
        if !compound.matches(current) {
            return false;
        }
        if step == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => current
                .parent
                .is_some_and(|parent| self.matches_step(nodes, parent, step - 1)),
            Combinator::Descendant => {
                let mut ancestor = current.parent;
                while let Some(candidate) = ancestor {
                    if self.matches_step(nodes, candidate, step - 1) {
                        return true;
                    }
                    ancestor = nodes.get(candidate.0).and_then(|n| n.parent);
                }
                false
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut consumed = false;

    match chars.peek() {
        Some('*') => {
            chars.next();
            consumed = true;
        }
        Some(&c) if is_ident_char(c) => {
            compound.tag = Some(read_ident(chars).to_ascii_lowercase());
            consumed = true;
        }
        _ => {}
    }

    while let Some(&c) = chars.peek() {
        match c {
            '#' => {
                chars.next();
                let id = read_ident(chars);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
            }
            '.' => {
                chars.next();
                let class = read_ident(chars);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                compound.attributes.push(parse_attribute(chars)?);
            }
            c if c.is_whitespace() || c == '>' => break,
            _ => return None,
        }
        consumed = true;
    }

    consumed.then_some(compound)
}

fn parse_attribute(chars: &mut Peekable<Chars<'_>>) -> Option<(String, Option<String>)> {
    skip_whitespace(chars);
    let name = read_ident(chars);
    if name.is_empty() {
        return None;
    }
    skip_whitespace(chars);
    match chars.next()? {
        ']' => Some((name, None)),
        '=' => {
            skip_whitespace(chars);
            let value = match chars.peek() {
                Some(&quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        let c = chars.next()?;
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                    value
                }
                _ => read_ident(chars),
            };
            skip_whitespace(chars);
            (chars.next()? == ']').then_some((name, Some(value)))
        }
        _ => None,
    }
}
