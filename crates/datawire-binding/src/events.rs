//! Event wiring for `bind-` and `on-` markers.
//!
//! Listeners hold weak handles to both the component and their element,
//! so a listener left on a detached element never keeps a component
//! alive. Each listener run ends with exactly one update pass.

use std::rc::Rc;

use datawire_dom::{Element, Event, ListenerError};
use datawire_expr::Rule;

use crate::component::{Lifecycle, Model, WeakComponent};
use crate::error::{BindingError, Result};

/// Listener for a `bind-<prop>` marker: copies `property` from the element
/// into `field`, then updates.
pub(crate) fn bind_listener<M: Model>(
	component: WeakComponent<M>,
	el: &Element,
	property: String,
	field: String,
) -> impl Fn(&Event) -> std::result::Result<(), ListenerError> + 'static {
	let el = el.downgrade();
	move |event| {
		let (Some(component), Some(el)) = (component.upgrade(), el.upgrade()) else {
			return Ok(());
		};
		if component.lifecycle() == Lifecycle::Disconnected {
			return Ok(());
		}
		let result = component
			.set_field(&field, el.property(&property))
			.and_then(|()| component.update());
		report(result, event)
	}
}

/// Listener for an `on-<event>` marker: runs the handler with `$el` and
/// `$event` bound, then updates.
pub(crate) fn handler_listener<M: Model>(
	component: WeakComponent<M>,
	el: &Element,
	event_type: String,
	rule: Rc<Rule>,
) -> impl Fn(&Event) -> std::result::Result<(), ListenerError> + 'static {
	let el = el.downgrade();
	move |event| {
		let (Some(component), Some(el)) = (component.upgrade(), el.upgrade()) else {
			return Ok(());
		};
		if component.lifecycle() == Lifecycle::Disconnected {
			return Ok(());
		}
		tracing::trace!(element = %el.tag_name(), event = %event_type, "running handler");
		let result = component
			.run_handler(&el, &rule, event)
			.and_then(|()| component.update());
		report(result, event)
	}
}

fn report(result: Result<()>, event: &Event) -> std::result::Result<(), ListenerError> {
	result.map_err(|e| {
		tracing::warn!(event = %event.event_type(), error = %e, "event listener failed");
		ListenerError::from(e)
	})
}

/// Dispatches `event` on `el`, converting a listener failure into
/// [`BindingError::Listener`].
///
/// # Example
///
/// ```
/// use datawire_binding::events::dispatch;
/// use datawire_binding::prelude::*;
///
/// let root = Element::from_markup(
///     r#"<button data-on-click="{ this.count = (this.count||0)+1 }" data-text="count"></button>"#,
/// )
/// .unwrap();
/// let component = Component::new(root.clone(), ());
/// component.setup().unwrap();
///
/// dispatch(&root, &Event::click()).unwrap();
/// assert_eq!(root.text_content(), "1");
/// ```
pub fn dispatch(el: &Element, event: &Event) -> Result<()> {
	el.dispatch_event(event)
		.map_err(|e| BindingError::Listener(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::Component;
	use datawire_dom::Value;

	#[test]
	fn test_bind_copies_property() {
		let root = Element::from_markup(r#"<input data-bind-value="username">"#).unwrap();
		let c = Component::new(root.clone(), ());
		c.setup().unwrap();

		root.set_property("value", Value::from("alice")).unwrap();
		dispatch(&root, &Event::input()).unwrap();
		assert_eq!(c.field("username").unwrap(), Value::from("alice"));
	}

	#[test]
	fn test_handler_sees_event() {
		let root = Element::from_markup(r#"<form data-on-submit="$event.preventDefault()"></form>"#)
			.unwrap();
		let c = Component::new(root.clone(), ());
		c.setup().unwrap();

		let event = Event::new("submit");
		dispatch(&root, &event).unwrap();
		assert!(event.default_prevented());
	}

	#[test]
	fn test_handler_error_becomes_listener_error() {
		let root = Element::from_markup(r#"<button data-on-click="save()"></button>"#).unwrap();
		let c = Component::new(root.clone(), ());
		c.setup().unwrap();

		let err = dispatch(&root, &Event::click()).unwrap_err();
		match err {
			BindingError::Listener(message) => assert!(message.contains("save"), "{message}"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_listener_outlives_component() {
		let root = Element::from_markup(r#"<button data-on-click="n = 1"></button>"#).unwrap();
		let c = Component::new(root.clone(), ());
		c.setup().unwrap();
		drop(c);

		assert_eq!(root.listener_count("click"), 1);
		dispatch(&root, &Event::click()).unwrap();
	}
}
