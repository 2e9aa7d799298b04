//! The in-process settings store.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
	value::{Change, Raw, Value},
	watch::{ChangeSource, WatchCallback, WatchOptions, WatchToken},
};

/// An in-process key-value settings store with change notifications.
///
/// Handles are cheap to clone and refer to the same underlying store.
/// Writes ([`set`](`Store::set`) / [`remove`](`Store::remove`)) dispatch a
/// [`Change`] to every watcher registered for the written key, on the
/// writing thread, in registration order.
#[derive(Clone, Default)]
pub struct Store {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	values: Mutex<HashMap<String, Value>>,
	watchers: Mutex<HashMap<String, Vec<Watcher>>>,
	generation: AtomicU64,
	/// Serializes value-table updates together with their dispatch, so
	/// callback invocations never overlap and always observe changes in
	/// the order they were applied. Reentrant, so callbacks may write
	/// back into the store from the dispatching thread.
	dispatch: ReentrantMutex<()>,
}

struct Watcher {
	token: WatchToken,
	options: WatchOptions,
	callback: WatchCallback,
}

impl Store {
	/// Creates an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The current value of `key`, if any.
	#[must_use]
	pub fn get(&self, key: &str) -> Option<Value> {
		self.inner.values.lock().get(key).cloned()
	}

	/// Stores `value` under `key` and notifies that key's watchers.
	pub fn set(&self, key: &str, value: Value) {
		let _dispatch = self.inner.dispatch.lock();
		let old = self
			.inner
			.values
			.lock()
			.insert(key.to_owned(), value.clone());
		self.notify(key, old, Some(value));
	}

	/// Clears `key` and notifies that key's watchers.
	///
	/// Clearing a key that holds no value still notifies; watchers see
	/// [`Raw::Absent`] in both populated slots.
	pub fn remove(&self, key: &str) {
		let _dispatch = self.inner.dispatch.lock();
		let old = self.inner.values.lock().remove(key);
		self.notify(key, old, None);
	}

	/// The number of watchers currently registered for `key`.
	#[must_use]
	pub fn watcher_count(&self, key: &str) -> usize {
		self.inner
			.watchers
			.lock()
			.get(key)
			.map_or(0, Vec::len)
	}

	fn notify(&self, key: &str, old: Option<Value>, new: Option<Value>) {
		// Snapshot the callbacks so they can re-enter the store (or
		// unregister) without deadlocking on the watcher table.
		let callbacks: Vec<(WatchOptions, WatchCallback)> = {
			let watchers = self.inner.watchers.lock();
			let Some(list) = watchers.get(key) else {
				return;
			};
			list.iter()
				.map(|watcher| (watcher.options, Arc::clone(&watcher.callback)))
				.collect()
		};
		for (options, callback) in callbacks {
			let change = Change {
				key: key.to_owned(),
				old: options
					.contains(WatchOptions::OLD)
					.then(|| Raw::from(old.clone())),
				new: options
					.contains(WatchOptions::NEW)
					.then(|| Raw::from(new.clone())),
			};
			(*callback)(&change);
		}
	}
}

impl ChangeSource for Store {
	fn register(&self, key: &str, options: WatchOptions, callback: WatchCallback) -> WatchToken {
		assert!(!key.is_empty(), "can't observe the empty key");
		// Under the dispatch lock so the initial delivery can't interleave
		// with a concurrent write's dispatch to the same callback.
		let _dispatch = self.inner.dispatch.lock();
		let token = WatchToken(self.inner.generation.fetch_add(1, Ordering::Relaxed));
		self.inner
			.watchers
			.lock()
			.entry(key.to_owned())
			.or_default()
			.push(Watcher {
				token,
				options,
				callback: Arc::clone(&callback),
			});
		if options.contains(WatchOptions::INITIAL) {
			let current = self.inner.values.lock().get(key).cloned();
			(*callback)(&Change {
				key: key.to_owned(),
				old: None,
				new: options
					.contains(WatchOptions::NEW)
					.then(|| Raw::from(current)),
			});
		}
		token
	}

	fn unregister(&self, token: WatchToken) {
		let mut watchers = self.inner.watchers.lock();
		for list in watchers.values_mut() {
			list.retain(|watcher| watcher.token != token);
		}
	}
}
