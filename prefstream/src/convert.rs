//! Narrowing raw notification payloads into typed values, and back.
//!
//! Each [`FromRaw`] implementation is an ordered chain of shape rules;
//! the first matching rule wins and a payload no rule matches is `None`.
//! Conversion never surfaces an error: a mismatched payload is
//! indistinguishable from an absent value, by contract.

use prefhub::{Raw, Value};

/// Conversion from a raw notification payload.
///
/// [`Raw::Absent`] converts to `None` unconditionally, before any rule is
/// consulted. A payload that already has the target's exact shape passes
/// through unchanged; this also covers re-entrant notifications that carry
/// a previously-converted value.
pub trait FromRaw: Sized {
	/// Narrows `raw` into `Self`, or `None` if no rule matches.
	fn from_raw(raw: &Raw) -> Option<Self>;
}

/// Conversion into a storable [`Value`]: the write half of an accessor.
pub trait IntoRaw {
	/// The [`Value`] to store for `self`.
	fn into_raw(self) -> Value;
}

impl FromRaw for bool {
	fn from_raw(raw: &Raw) -> Option<Self> {
		match raw.value()? {
			Value::Bool(value) => Some(*value),
			Value::Str(text) => text.parse().ok(),
			_ => None,
		}
	}
}

impl IntoRaw for bool {
	fn into_raw(self) -> Value {
		Value::Bool(self)
	}
}

impl FromRaw for i64 {
	fn from_raw(raw: &Raw) -> Option<Self> {
		match raw.value()? {
			Value::Int(value) => Some(*value),
			Value::Str(text) => text.parse().ok(),
			_ => None,
		}
	}
}

impl IntoRaw for i64 {
	fn into_raw(self) -> Value {
		Value::Int(self)
	}
}

impl FromRaw for f64 {
	#[allow(clippy::cast_precision_loss)]
	fn from_raw(raw: &Raw) -> Option<Self> {
		match raw.value()? {
			Value::Float(value) => Some(*value),
			Value::Int(value) => Some(*value as f64),
			Value::Str(text) => text.parse().ok(),
			_ => None,
		}
	}
}

impl IntoRaw for f64 {
	fn into_raw(self) -> Value {
		Value::Float(self)
	}
}

impl FromRaw for String {
	fn from_raw(raw: &Raw) -> Option<Self> {
		match raw.value()? {
			Value::Str(text) => Some(text.clone()),
			_ => None,
		}
	}
}

impl IntoRaw for String {
	fn into_raw(self) -> Value {
		Value::Str(self)
	}
}

impl IntoRaw for &str {
	fn into_raw(self) -> Value {
		Value::Str(self.to_owned())
	}
}

/// Conversion rule for closed enumerations with a string discriminant:
/// a string payload is looked up as the discriminant, anything else is
/// `None`.
pub fn string_backed<V>(raw: &Raw, lookup: impl FnOnce(&str) -> Option<V>) -> Option<V> {
	match raw.value()? {
		Value::Str(text) => lookup(text),
		_ => None,
	}
}

/// Conversion rule for closed enumerations with an integer discriminant:
/// an integer payload is looked up directly, a string payload is parsed to
/// an integer first, and anything else (or a failed parse/lookup) is
/// `None`.
///
/// A raw `"1"` therefore converts exactly like a raw `1`.
pub fn int_backed<V>(raw: &Raw, lookup: impl FnOnce(i64) -> Option<V>) -> Option<V> {
	match raw.value()? {
		Value::Int(code) => lookup(*code),
		Value::Str(text) => text.parse().ok().and_then(lookup),
		_ => None,
	}
}
