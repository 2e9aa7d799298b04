use std::fmt::{self, Debug, Formatter};

/// A scoped teardown handle.
///
/// Wraps a teardown action and guarantees it runs at most once, either
/// through an explicit [`dispose`](`Disposal::dispose`) call or implicitly
/// when the handle is dropped at the end of its owning scope.
///
/// Teardown actions are assumed non-failing; there is no error path here.
#[must_use = "Dropping a `Disposal` runs its teardown immediately."]
pub struct Disposal(Option<Box<dyn FnOnce() + Send>>);

impl Disposal {
	/// Wraps `teardown` so it runs on disposal.
	pub fn new(teardown: impl 'static + Send + FnOnce()) -> Self {
		Self(Some(Box::new(teardown)))
	}

	/// Runs the teardown action now, if it hasn't run yet.
	///
	/// Idempotent: repeated calls, and the drop that eventually follows,
	/// are no-ops once the action has run.
	pub fn dispose(&mut self) {
		if let Some(teardown) = self.0.take() {
			teardown();
		}
	}

	/// Whether the teardown action has already run.
	#[must_use]
	pub fn is_disposed(&self) -> bool {
		self.0.is_none()
	}
}

impl Drop for Disposal {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl Debug for Disposal {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Disposal")
			.field(if self.is_disposed() {
				&"disposed"
			} else {
				&"armed"
			})
			.finish()
	}
}
