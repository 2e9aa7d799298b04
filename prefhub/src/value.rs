//! The loosely-typed payload shapes the store holds and emits.

/// A stored settings value.
///
/// This is a closed sum of the few concrete shapes the store may hold.
/// Narrowing a [`Value`] into a caller's strongly-typed representation is
/// out of scope here and happens in the consuming layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// A boolean flag.
	Bool(bool),
	/// A signed integer.
	Int(i64),
	/// A floating-point number.
	Float(f64),
	/// A string.
	Str(String),
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Str(value.to_owned())
	}
}

/// One payload slot of a change notification.
///
/// [`Absent`](`Raw::Absent`) is the explicit null/clear indicator: the key
/// holds no value. It is distinct from a slot that was not populated at all
/// (see [`Change`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Raw {
	/// The key holds no value.
	Absent,
	/// The key holds this value.
	Present(Value),
}

impl Raw {
	/// The contained [`Value`], if any.
	#[must_use]
	pub fn value(&self) -> Option<&Value> {
		match self {
			Self::Absent => None,
			Self::Present(value) => Some(value),
		}
	}
}

impl From<Option<Value>> for Raw {
	fn from(value: Option<Value>) -> Self {
		match value {
			None => Self::Absent,
			Some(value) => Self::Present(value),
		}
	}
}

/// The change record dispatched to watchers.
///
/// `old` and `new` are populated according to the watcher's
/// [`WatchOptions`](`crate::WatchOptions`); an unpopulated slot is `None`
/// at the outer level, while an explicitly cleared key is
/// `Some(Raw::Absent)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
	/// The key that changed.
	pub key: String,
	/// The value before the change, if requested.
	pub old: Option<Raw>,
	/// The value after the change, if requested.
	pub new: Option<Raw>,
}
