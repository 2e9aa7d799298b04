//! Watcher registration: options, tokens and the [`ChangeSource`] capability.

use std::{ops::BitOr, sync::Arc};

use crate::value::Change;

/// Selects which payload slots a watcher receives, and whether it is
/// notified of the current state at registration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchOptions(u8);

impl WatchOptions {
	/// Deliver one notification with the current state during registration.
	///
	/// The current state arrives in the new-value slot, so this is normally
	/// combined with [`NEW`](`Self::NEW`).
	pub const INITIAL: Self = Self(1);
	/// Populate the new-value slot of each notification.
	pub const NEW: Self = Self(1 << 1);
	/// Populate the old-value slot of each notification.
	pub const OLD: Self = Self(1 << 2);

	/// No options at all.
	#[must_use]
	pub const fn empty() -> Self {
		Self(0)
	}

	/// Whether every option in `other` is set in `self`.
	#[must_use]
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}
}

impl BitOr for WatchOptions {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

/// Identity of one watcher registration.
///
/// Tokens come from a per-store generation counter and are never reused, so
/// a stale token can only ever match its own (possibly already removed)
/// registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchToken(pub(crate) u64);

/// The callback shape watchers register.
///
/// Shared so the store can dispatch outside its own locks.
pub type WatchCallback = Arc<dyn Fn(&Change) + Send + Sync>;

/// Capability to observe changes to keyed values.
///
/// This is the seam between the substrate and its observers: anything that
/// can register and unregister keyed watchers can back the observation
/// layer.
///
/// # Logic
///
/// For a given registration, callback invocations **must not** overlap and
/// **must** occur in the order the underlying changes were applied.
/// After `unregister` returns, the registration's callback **may** still be
/// invoked at most once by a dispatch that was already in flight; observers
/// that need a hard cut-off must gate on their own flag.
pub trait ChangeSource {
	/// Registers `callback` for changes to `key`.
	///
	/// # Panics
	///
	/// Iff `key` is not observable on this source. Observing an
	/// unsupported key is a programming error, not a runtime condition.
	fn register(&self, key: &str, options: WatchOptions, callback: WatchCallback) -> WatchToken;

	/// Removes the registration identified by `token`.
	///
	/// Unknown and already-removed tokens are ignored.
	fn unregister(&self, token: WatchToken);
}
