//! Domain layer for scrollplay.
//!
//! This module contains the core types that do not depend on any document
//! implementation: the error type and the cursor-carrying sequence that backs the
//! playlist.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`sequence`]: Index-addressable sequence with a clamped cursor
//!
//! # Examples
//!
//! ```
//! use scrollplay::domain::IndexedSequence;
//!
//! let mut sequence = IndexedSequence::new();
//! sequence.set_nodes(vec!["a", "b", "c"]);
//! sequence.next();
//! assert_eq!(sequence.current(), Some(&"b"));
//! ```

pub mod error;
pub mod sequence;

pub use error::{Result, ScrollplayError};
pub use sequence::IndexedSequence;
