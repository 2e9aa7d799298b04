use std::{
	cell::RefCell,
	collections::VecDeque,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use parking_lot::ReentrantMutex;
use prefhub::{Change, ChangeSource, Raw, WatchCallback, WatchOptions, WatchToken};

use crate::{convert::FromRaw, disposal::Disposal};

/// Observation of one key on a [`ChangeSource`], with scoped teardown.
///
/// Implemented for every clonable [`ChangeSource`].
pub trait Observe: ChangeSource {
	/// Registers `on_change` for raw payloads of changes to `key`.
	///
	/// Per `options`, the forwarded payload is the new-value slot
	/// ([`WatchOptions::NEW`]) or else the old-value slot; an unpopulated
	/// slot arrives as [`Raw::Absent`]. Notifications for other keys, or
	/// arriving after disposal, never reach `on_change`.
	///
	/// The returned [`Disposal`]'s teardown unregisters the observer. This
	/// is the only path by which the registration is released, and it
	/// releases at most once.
	///
	/// `on_change` may itself write the observed key: a notification that
	/// arrives re-entrantly from within the callback is queued and
	/// forwarded, in arrival order, once the current call returns.
	///
	/// # Panics
	///
	/// Iff `key` is not observable on this source (see
	/// [`ChangeSource::register`]).
	fn observe(
		&self,
		key: &str,
		options: WatchOptions,
		on_change: impl 'static + Send + FnMut(Raw),
	) -> Disposal;

	/// Like [`observe`](`Observe::observe`), but payloads arrive already
	/// narrowed through `V`'s [`FromRaw`] chain.
	fn observe_typed<V: 'static + FromRaw>(
		&self,
		key: &str,
		options: WatchOptions,
		mut on_change: impl 'static + Send + FnMut(Option<V>),
	) -> Disposal {
		self.observe(key, options, move |raw| on_change(V::from_raw(&raw)))
	}
}

impl<S: 'static + ChangeSource + Clone + Send> Observe for S {
	fn observe(
		&self,
		key: &str,
		options: WatchOptions,
		on_change: impl 'static + Send + FnMut(Raw),
	) -> Disposal {
		let observer = KeyObserver::attach(self.clone(), key, options, on_change);
		Disposal::new(move || observer.invalidate())
	}
}

/// The callback state behind the reentrant guard: the caller's handler
/// plus the payloads queued by re-entrant notifications.
struct Guarded<F> {
	on_change: RefCell<F>,
	queued: RefCell<VecDeque<Raw>>,
}

/// One live registration against a substrate, with an idempotent
/// [`invalidate`](`KeyObserver::invalidate`).
struct KeyObserver<S: ChangeSource> {
	source: S,
	token: WatchToken,
	invalidated: Arc<AtomicBool>,
}

impl<S: ChangeSource> KeyObserver<S> {
	fn attach(
		source: S,
		key: &str,
		options: WatchOptions,
		on_change: impl 'static + Send + FnMut(Raw),
	) -> Self {
		let invalidated = Arc::new(AtomicBool::new(false));
		let callback: WatchCallback = {
			let invalidated = Arc::clone(&invalidated);
			let key = key.to_owned();
			// Reentrant guard around the caller's `FnMut`: a notification
			// arriving from within `on_change` (the callback wrote the
			// observed key) is queued and drained by the outer invocation
			// once its `on_change` call returns, preserving arrival order.
			// Cross-thread invocations serialize on the outer mutex.
			let guarded = ReentrantMutex::new(Guarded {
				on_change: RefCell::new(on_change),
				queued: RefCell::new(VecDeque::new()),
			});
			Arc::new(move |change: &Change| {
				// The substrate may still dispatch a change that was in
				// flight when the registration was removed; those, and
				// changes to any other key, take the no-op path.
				if invalidated.load(Ordering::Acquire) || change.key != key {
					return;
				}
				let slot = if options.contains(WatchOptions::NEW) {
					&change.new
				} else {
					&change.old
				};
				let guarded = guarded.lock();
				guarded
					.queued
					.borrow_mut()
					.push_back(slot.clone().unwrap_or(Raw::Absent));
				let Ok(mut on_change) = guarded.on_change.try_borrow_mut() else {
					// Re-entrant arrival: the invocation further up the
					// stack drains the queue.
					return;
				};
				loop {
					let next = guarded.queued.borrow_mut().pop_front();
					match next {
						Some(raw) => (*on_change)(raw),
						None => break,
					}
				}
			})
		};
		let token = source.register(key, options, callback);
		Self {
			source,
			token,
			invalidated,
		}
	}

	/// Unregisters from the substrate at most once, no matter how often
	/// this is called.
	fn invalidate(&self) {
		if !self.invalidated.swap(true, Ordering::AcqRel) {
			self.source.unregister(self.token);
		}
	}
}
