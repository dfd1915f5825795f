//! Events and listener plumbing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::value::Value;

/// Error returned by a listener. Dispatch stops at the first one.
pub type ListenerError = Box<dyn std::error::Error + 'static>;

/// Type alias for event listener functions.
pub type Listener = Rc<dyn Fn(&Event) -> Result<(), ListenerError> + 'static>;

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A dispatched event.
///
/// Cloning yields another handle to the same event, so a flag set by
/// `prevent_default` is visible to every holder.
#[derive(Clone)]
pub struct Event(Rc<EventData>);

struct EventData {
	event_type: String,
	target: RefCell<Option<Element>>,
	detail: Value,
	default_prevented: Cell<bool>,
}

impl Event {
	/// Creates an event of the given type.
	pub fn new(event_type: impl Into<String>) -> Self {
		Self::with_detail(event_type, Value::Undefined)
	}

	/// Creates an event carrying a detail payload.
	pub fn with_detail(event_type: impl Into<String>, detail: Value) -> Self {
		Self(Rc::new(EventData {
			event_type: event_type.into(),
			target: RefCell::new(None),
			detail,
			default_prevented: Cell::new(false),
		}))
	}

	/// Shorthand for an `input` event.
	pub fn input() -> Self {
		Self::new("input")
	}

	/// Shorthand for a `click` event.
	pub fn click() -> Self {
		Self::new("click")
	}

	/// The event type, e.g. `"click"`.
	pub fn event_type(&self) -> &str {
		&self.0.event_type
	}

	/// The element the event was dispatched on, once dispatched.
	pub fn target(&self) -> Option<Element> {
		self.0.target.borrow().clone()
	}

	pub(crate) fn set_target(&self, target: &Element) {
		*self.0.target.borrow_mut() = Some(target.clone());
	}

	/// The detail payload.
	pub fn detail(&self) -> &Value {
		&self.0.detail
	}

	/// Marks the default action as cancelled.
	pub fn prevent_default(&self) {
		self.0.default_prevented.set(true);
	}

	/// Whether a listener called [`Event::prevent_default`].
	pub fn default_prevented(&self) -> bool {
		self.0.default_prevented.get()
	}
}

impl PartialEq for Event {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("type", &self.0.event_type)
			.field("default_prevented", &self.0.default_prevented.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_new() {
		let ev = Event::new("submit");
		assert_eq!(ev.event_type(), "submit");
		assert!(ev.target().is_none());
		assert_eq!(ev.detail(), &Value::Undefined);
		assert!(!ev.default_prevented());
	}

	#[test]
	fn test_prevent_default_shared_between_clones() {
		let ev = Event::click();
		let other = ev.clone();
		other.prevent_default();
		assert!(ev.default_prevented());
		assert_eq!(ev, other);
		assert_ne!(ev, Event::click());
	}
}
