#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! The store dispatches notifications on whichever thread performed the
//! write, so each [`Subscription`]'s demand counter and held value sit
//! behind a mutex. Delivery to a given subscriber never overlaps: the
//! subscriber is held exclusively while it receives.

mod disposal;
pub use disposal::Disposal;

mod observer;
pub use observer::Observe;

pub mod convert;
pub use convert::{FromRaw, IntoRaw};

mod stream;
pub use stream::{Demand, Subscriber, Subscription, ValueStream};

mod values;
pub use values::Values;

mod pref;
pub use pref::Pref;

#[doc = include_str!("../README.md")]
mod readme {}
