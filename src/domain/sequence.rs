//! Index-addressable sequence with a clamped cursor.
//!
//! [`IndexedSequence`] is the playlist's backing store: an ordered list of nodes that
//! is replaced wholesale whenever the page grows, plus a cursor marking the current
//! position. The cursor is `None` until the first call to
//! [`set_nodes`](IndexedSequence::set_nodes).
//!
//! Replacing the nodes keeps an initialized cursor at its numeric value even when
//! the new list is shorter. Callers that shrink the list must not assume
//! [`current`](IndexedSequence::current) is `Some` afterwards.

/// Ordered nodes plus a cursor.
#[derive(Debug, Clone)]
pub struct IndexedSequence<T> {
    nodes: Vec<T>,
    current_index: Option<usize>,
}

impl<T> Default for IndexedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedSequence<T> {
    /// Creates an empty, uninitialized sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            current_index: None,
        }
    }

    /// Replaces the nodes.
    ///
    /// Initializes the cursor to `0` on first use; an initialized cursor is left
    /// untouched, even if it now points past the end.
    pub fn set_nodes(&mut self, nodes: Vec<T>) {
        self.nodes = nodes;
        if self.current_index.is_none() {
            self.current_index = Some(0);
        }
    }

    /// Moves the cursor to `index` if it is within bounds; ignored otherwise.
    pub fn set_current_index(&mut self, index: usize) {
        if index < self.nodes.len() {
            self.current_index = Some(index);
        }
    }

    /// Cursor position, `None` while uninitialized.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Node under the cursor, `None` if uninitialized or out of bounds.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.current_index.and_then(|index| self.nodes.get(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the last node, `None` when empty.
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Advances the cursor by one unless it is already at the last index.
    pub fn next(&mut self) {
        let candidate = self.current_index.map_or(0, |index| index + 1);
        if candidate < self.nodes.len() {
            self.current_index = Some(candidate);
        }
    }

    /// Moves the cursor back by one unless it is already at index `0`.
    pub fn prev(&mut self) {
        if let Some(index) = self.current_index {
            if index > 0 {
                self.current_index = Some(index - 1);
            }
        }
    }
}
