#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! [`Store`] serializes writes together with their dispatch under one
//! reentrant lock: watcher callbacks run on the thread that performed the
//! write, after the value table was updated and outside the watcher-table
//! lock, so they may re-enter the store freely. Concurrent writers to the
//! same key therefore never overlap a registration's callback, and
//! callbacks observe changes in the order they were applied.

pub mod store;
pub mod value;
pub mod watch;

pub use store::Store;
pub use value::{Change, Raw, Value};
pub use watch::{ChangeSource, WatchCallback, WatchOptions, WatchToken};

#[doc = include_str!("../README.md")]
mod readme {}
