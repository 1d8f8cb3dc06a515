//! Tracing setup.
//!
//! Scrollplay logs through `tracing` macros everywhere. This module installs the
//! subscriber that turns those events into console lines:
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → ConsoleWriter → console.log / stderr
//! ```
//!
//! # Configuration
//!
//! The filter comes from `trace_level` in [`Config`](crate::Config), falling back
//! to `"info"` when unset or unparsable.
//!
//! # Usage
//!
//! ```rust
//! use scrollplay::observability::init_tracing;
//! use scrollplay::Config;
//!
//! let config = Config::default();
//! init_tracing(&config);
//!
//! tracing::debug!("tracing is now active");
//! ```
//!
//! # Modules
//!
//! - [`init`]: subscriber setup
//! - [`console_writer`]: line-buffered writer for the browser console or stderr

pub mod console_writer;
mod init;

pub use console_writer::{ConsoleMakeWriter, ConsoleWriter};
pub use init::init_tracing;
