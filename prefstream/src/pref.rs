use std::{
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};

use prefhub::{Raw, Store, WatchOptions};
use tap::Pipe;

use crate::{
	convert::{FromRaw, IntoRaw},
	disposal::Disposal,
	observer::Observe,
	stream::ValueStream,
};

/// A typed accessor for one stored key.
///
/// Thin by design: reads and writes go straight through the store via `V`'s
/// [`FromRaw`]/[`IntoRaw`] chains, and [`changes`](`Pref::changes`) hands
/// out the demand-driven stream for the key.
pub struct Pref<V> {
	store: Store,
	name: String,
	_phantom: PhantomData<fn() -> V>,
}

impl<V> Pref<V> {
	/// Binds a typed accessor to `name` in `store`.
	pub fn new(store: &Store, name: impl Into<String>) -> Self {
		Self {
			store: store.clone(),
			name: name.into(),
			_phantom: PhantomData,
		}
	}

	/// The key this accessor reads and writes.
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}
}

impl<V: FromRaw> Pref<V> {
	/// The current value, narrowed through `V`'s conversion chain.
	///
	/// An unset key, and a stored value the chain doesn't match, are both
	/// `None`.
	#[must_use]
	pub fn get(&self) -> Option<V> {
		Raw::from(self.store.get(&self.name)).pipe(|raw| V::from_raw(&raw))
	}
}

impl<V: IntoRaw> Pref<V> {
	/// Stores `value` under the key; `None` clears it.
	pub fn set(&self, value: Option<V>) {
		match value {
			Some(value) => self.store.set(&self.name, value.into_raw()),
			None => self.store.remove(&self.name),
		}
	}
}

impl<V: 'static + FromRaw> Pref<V> {
	/// Observes the key with direct typed callbacks, without the demand
	/// protocol. `on_change` first receives the current state, then every
	/// subsequent new value.
	pub fn observe(&self, on_change: impl 'static + Send + FnMut(Option<V>)) -> Disposal {
		self.store.observe_typed(
			&self.name,
			WatchOptions::INITIAL | WatchOptions::NEW,
			on_change,
		)
	}
}

impl<V> Pref<V> {
	/// The demand-driven change stream for this key.
	///
	/// Each subscriber receives the state at attach time plus every
	/// subsequent new value, as its demand allows.
	#[must_use]
	pub fn changes(&self) -> ValueStream<V> {
		ValueStream::observed(self.store.clone(), &*self.name)
	}
}

impl<V> Clone for Pref<V> {
	fn clone(&self) -> Self {
		Self {
			store: self.store.clone(),
			name: self.name.clone(),
			_phantom: PhantomData,
		}
	}
}

impl<V> Debug for Pref<V> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pref").field("name", &self.name).finish()
	}
}
