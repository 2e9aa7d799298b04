use std::{
	fmt::{self, Debug, Formatter},
	ops::AddAssign,
	sync::Arc,
};

use parking_lot::Mutex;
use prefhub::{Store, WatchOptions};

use crate::{convert::FromRaw, disposal::Disposal, observer::Observe};

/// How many values a subscriber is currently willing to receive.
///
/// Either a finite count or [`UNLIMITED`](`Demand::UNLIMITED`). Addition
/// saturates at unlimited; delivering a value consumes one unit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Demand(Option<u64>);

impl Demand {
	/// No demand at all. Values observed now are held, not delivered.
	pub const NONE: Self = Self(Some(0));
	/// Unbounded demand. Every observed value is delivered immediately.
	pub const UNLIMITED: Self = Self(None);

	/// Demand for at most `count` values.
	#[must_use]
	pub const fn max(count: u64) -> Self {
		Self(Some(count))
	}

	/// Whether no further value may be delivered right now.
	#[must_use]
	pub const fn is_exhausted(self) -> bool {
		matches!(self.0, Some(0))
	}

	fn decrement(&mut self) {
		if let Some(count) = &mut self.0 {
			*count = count.saturating_sub(1);
		}
	}
}

impl AddAssign for Demand {
	fn add_assign(&mut self, rhs: Self) {
		self.0 = match (self.0, rhs.0) {
			(Some(have), Some(more)) => Some(have.saturating_add(more)),
			_ => None,
		};
	}
}

impl Debug for Demand {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.0 {
			Some(count) => f.debug_tuple("Demand").field(&count).finish(),
			None => f.write_str("Demand(unlimited)"),
		}
	}
}

/// Receives delivered values.
///
/// The returned [`Demand`] is *additional* demand requested inline during
/// receipt; return [`Demand::NONE`] to rely on explicit
/// [`Subscription::request`] calls instead.
pub trait Subscriber<V>: Send {
	/// Receives one value.
	fn receive(&mut self, value: V) -> Demand;
}

impl<V, F: Send + FnMut(V) -> Demand> Subscriber<V> for F {
	fn receive(&mut self, value: V) -> Demand {
		self(value)
	}
}

/// A cold stream of converted values.
///
/// Observed variants carry a store key; every
/// [`subscribe`](`ValueStream::subscribe`) creates exactly one key observer
/// configured to deliver the current state plus each subsequent new value.
/// Constant variants carry one fixed value and no observer.
pub struct ValueStream<V> {
	kind: Kind<V>,
}

enum Kind<V> {
	Observed { store: Store, key: String },
	Constant(Option<V>),
}

impl<V> ValueStream<V> {
	/// A stream of the converted values of `key` in `store`.
	pub fn observed(store: Store, key: impl Into<String>) -> Self {
		Self {
			kind: Kind::Observed {
				store,
				key: key.into(),
			},
		}
	}

	/// A stream that delivers `value` once (subject to demand) and then
	/// stays open but silent forever. It never completes and never emits
	/// again.
	pub fn constant(value: Option<V>) -> Self {
		Self {
			kind: Kind::Constant(value),
		}
	}
}

impl<V: 'static + Clone + Send + FromRaw> ValueStream<V> {
	/// Attaches `subscriber` to a fresh [`Subscription`] of this stream.
	///
	/// The subscription starts with [`Demand::NONE`]; nothing is delivered
	/// until demand is requested. The current state of the observed key is
	/// already pending at that point, so the first delivery always carries
	/// the state at attach time, never a spurious absent value.
	pub fn subscribe(&self, subscriber: impl 'static + Subscriber<Option<V>>) -> Subscription<V> {
		let shared = Arc::new(Mutex::new(State {
			subscriber: Some(Box::new(subscriber) as Box<dyn Subscriber<Option<V>>>),
			slot: Slot::Unobserved,
			demand: Demand::NONE,
			watch: None,
			active: true,
		}));
		match &self.kind {
			Kind::Observed { store, key } => {
				let watch = store.observe_typed::<V>(
					key,
					WatchOptions::INITIAL | WatchOptions::NEW,
					{
						let shared = Arc::clone(&shared);
						move |value| {
							{
								let mut state = shared.lock();
								if !state.active {
									return;
								}
								// Latest value wins: an undelivered value
								// is overwritten, never queued behind.
								state.slot = Slot::Pending(value);
							}
							pump(&shared);
						}
					},
				);
				shared.lock().watch = Some(watch);
			}
			Kind::Constant(value) => {
				shared.lock().slot = Slot::Pending(value.clone());
			}
		}
		Subscription { shared }
	}
}

impl<V> Debug for ValueStream<V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.kind {
			Kind::Observed { key, .. } => f.debug_struct("ValueStream").field("key", key).finish(),
			Kind::Constant(_) => f.write_str("ValueStream(constant)"),
		}
	}
}

/// One subscriber's live connection to a [`ValueStream`].
///
/// Holds the demand counter, the (single) held value and the backing key
/// observer. Exhausted demand is not terminal; only
/// [`cancel`](`Subscription::cancel`) is.
#[must_use = "Subscriptions are cancelled when dropped."]
pub struct Subscription<V> {
	shared: Arc<Mutex<State<V>>>,
}

struct State<V> {
	/// `None` while cancelled, or temporarily while the subscriber is
	/// receiving a value.
	subscriber: Option<Box<dyn Subscriber<Option<V>>>>,
	slot: Slot<V>,
	demand: Demand,
	watch: Option<Disposal>,
	active: bool,
}

/// The three-state value slot: distinguishes "no notification yet" from
/// "observed an absent value", and records whether the latest observed
/// value still awaits delivery.
enum Slot<V> {
	/// No notification has arrived.
	Unobserved,
	/// The latest observed value, not yet delivered.
	Pending(Option<V>),
	/// Everything observed so far has been delivered.
	Idle,
}

impl<V> Slot<V> {
	fn take_pending(&mut self) -> Option<Option<V>> {
		match std::mem::replace(self, Slot::Idle) {
			Slot::Pending(value) => Some(value),
			observed_or_not => {
				*self = observed_or_not;
				None
			}
		}
	}
}

impl<V> Subscription<V> {
	/// Adds `demand` (saturating at unlimited) and delivers the held
	/// value, if any.
	pub fn request(&self, demand: Demand) {
		{
			let mut state = self.shared.lock();
			if !state.active {
				return;
			}
			state.demand += demand;
		}
		pump(&self.shared);
	}

	/// Releases the subscriber and tears down the key observer. Terminal:
	/// once this returns, no further value can be delivered, even for a
	/// notification already in flight.
	pub fn cancel(&self) {
		let watch = {
			let mut state = self.shared.lock();
			state.active = false;
			state.subscriber = None;
			state.demand = Demand::NONE;
			state.watch.take()
		};
		// The observer teardown runs outside the state lock, as it may
		// synchronously re-enter the substrate.
		drop(watch);
	}
}

impl<V> Drop for Subscription<V> {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl<V> Debug for Subscription<V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let state = self.shared.lock();
		f.debug_struct("Subscription")
			.field("active", &state.active)
			.field("demand", &state.demand)
			.finish_non_exhaustive()
	}
}

/// Delivers pending values while demand allows.
///
/// Takes the subscriber out of the shared state for the duration of each
/// receipt, so deliveries never overlap and re-entrant notifications (or
/// inline demand) from within `receive` are picked up by the next loop
/// iteration instead of recursing.
fn pump<V>(shared: &Arc<Mutex<State<V>>>) {
	loop {
		let (mut subscriber, value) = {
			let mut state = shared.lock();
			if !state.active || state.demand.is_exhausted() {
				return;
			}
			let Some(subscriber) = state.subscriber.take() else {
				// A delivery is already in progress elsewhere; its loop
				// re-checks the slot after the subscriber returns.
				return;
			};
			match state.slot.take_pending() {
				Some(value) => {
					state.demand.decrement();
					(subscriber, value)
				}
				None => {
					state.subscriber = Some(subscriber);
					return;
				}
			}
		};
		let more = subscriber.receive(value);
		let mut state = shared.lock();
		if !state.active {
			// Cancelled during receipt; the subscriber is released here.
			return;
		}
		state.demand += more;
		state.subscriber = Some(subscriber);
	}
}
