//! Integration tests for the update cycle
//!
//! Covers the observable contract of a mounted component:
//! 1. Rules track field changes across update passes
//! 2. Listeners run exactly one pass per event
//! 3. Setup is all-or-nothing and the lifecycle is respected
//! 4. Repeated passes are idempotent

use std::cell::Cell;
use std::rc::Rc;

use datawire_binding::events::dispatch;
use datawire_binding::prelude::*;
use proptest::prelude::*;
use rstest::rstest;

/// Counts update passes so tests can check "exactly one per event".
#[derive(Default)]
struct PassCounter {
	passes: Rc<Cell<u32>>,
}

impl Model for PassCounter {
	fn pre_update(&mut self) {
		self.passes.set(self.passes.get() + 1);
	}
}

fn mount<M: Model>(markup: &str, model: M) -> (Element, Component<M>) {
	let root = Element::from_markup(markup).unwrap();
	let event_loop = EventLoop::new();
	let component = Component::mount(root.clone(), model, &event_loop);
	event_loop.run_until_idle().unwrap();
	(root, component)
}

#[test]
fn test_text_follows_field() {
	let root = Element::from_markup(r#"<form data-text="username.length"></form>"#).unwrap();
	let event_loop = EventLoop::new();
	let component = Component::mount(root.clone(), (), &event_loop);
	component.set_field("username", Value::from("abc")).unwrap();
	event_loop.run_until_idle().unwrap();
	assert_eq!(root.text_content(), "3");

	component.set_field("username", Value::from("abcde")).unwrap();
	component.update().unwrap();
	assert_eq!(root.text_content(), "5");
}

#[test]
fn test_click_counter() {
	let passes = Rc::new(Cell::new(0));
	let (button, component) = mount(
		r#"<button data-on-click="{ this.count = (this.count||0)+1 }"></button>"#,
		PassCounter {
			passes: Rc::clone(&passes),
		},
	);
	assert_eq!(component.field("count").unwrap(), Value::Undefined);
	assert_eq!(passes.get(), 1);

	dispatch(&button, &Event::click()).unwrap();
	assert_eq!(component.field("count").unwrap(), Value::from(1));
	assert_eq!(passes.get(), 2);

	dispatch(&button, &Event::click()).unwrap();
	assert_eq!(component.field("count").unwrap(), Value::from(2));
	assert_eq!(passes.get(), 3);
}

#[test]
fn test_bind_input_runs_one_pass() {
	let passes = Rc::new(Cell::new(0));
	let (form, component) = mount(
		r#"<form><input data-bind-value="username"><p data-text="username"></p></form>"#,
		PassCounter {
			passes: Rc::clone(&passes),
		},
	);
	let children = form.children();
	children[0].set_property("value", Value::from("V")).unwrap();
	dispatch(&children[0], &Event::input()).unwrap();

	assert_eq!(component.field("username").unwrap(), Value::from("V"));
	assert_eq!(children[1].text_content(), "V");
	assert_eq!(passes.get(), 2);
}

#[test]
fn test_bind_checkbox() {
	let (input, component) = mount(r#"<input type="checkbox" data-bind-checked="agreed">"#, ());
	input.set_property("checked", Value::Bool(true)).unwrap();
	dispatch(&input, &Event::input()).unwrap();
	assert_eq!(component.field("agreed").unwrap(), Value::Bool(true));
}

#[test]
fn test_malformed_marker_fails_setup() {
	let root =
		Element::from_markup(r#"<form><input data-bind-value="name"><p data-text="){"></p></form>"#)
			.unwrap();
	let event_loop = EventLoop::new();
	let component = Component::mount(root.clone(), (), &event_loop);

	let err = event_loop.run_until_idle().unwrap_err();
	assert!(matches!(err, BindingError::Compile { ref marker, .. } if marker == "data-text"));
	assert_eq!(component.lifecycle(), Lifecycle::Failed);
	assert_eq!(component.binding_count(), 0);
	assert_eq!(component.listener_count(), 0);
	assert_eq!(root.children()[0].listener_count("input"), 0);
}

#[test]
fn test_deeply_nested_marker_fails_setup() {
	let expression = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
	let root = Element::new("p");
	root.set_attribute("data-text", expression);
	let component = Component::new(root.clone(), ());

	let err = component.setup().unwrap_err();
	assert!(matches!(err, BindingError::Compile { ref marker, .. } if marker == "data-text"));
	assert!(err.to_string().ends_with("expression nested too deeply"));
	assert_eq!(component.lifecycle(), Lifecycle::Failed);
	assert_eq!(root.text_content(), "");
}

#[test]
fn test_disconnect_before_setup() {
	let root = Element::from_markup(r#"<p data-text="'bound'"></p>"#).unwrap();
	let event_loop = EventLoop::new();
	let component = Component::mount(root.clone(), (), &event_loop);
	component.disconnect().unwrap();
	root.remove();

	assert_eq!(event_loop.run_until_idle().unwrap(), 1);
	assert_eq!(component.lifecycle(), Lifecycle::Disconnected);
	assert_eq!(root.text_content(), "");
}

#[rstest]
#[case(r#"true"#, Some(""))]
#[case(r#"false"#, None)]
#[case(r#"'primary'"#, Some("primary"))]
#[case(r#"42"#, Some("42"))]
#[case(r#"null"#, Some("null"))]
fn test_attribute_marker_values(#[case] expression: &str, #[case] expected: Option<&str>) {
	let markup = format!(r#"<div data-aria-busy="{}"></div>"#, expression);
	let (div, _) = mount(&markup, ());
	assert_eq!(div.get_attribute("aria-busy").as_deref(), expected);
}

#[test]
fn test_boolean_attribute_toggles() {
	let (button, component) = mount(r#"<button data-disabled="busy"></button>"#, ());
	for busy in [true, false, true, false] {
		component.set_field("busy", Value::Bool(busy)).unwrap();
		component.update().unwrap();
		assert_eq!(button.has_attribute("disabled"), busy);
		if busy {
			assert_eq!(button.get_attribute("disabled").as_deref(), Some(""));
		}
	}
}

#[test]
fn test_html_marker_replaces_children() {
	let (div, component) = mount(r#"<div data-html="'<b>' + name + '</b>'"></div>"#, ());
	component.set_field("name", Value::from("x")).unwrap();
	component.update().unwrap();
	assert_eq!(div.inner_html(), "<b>x</b>");
}

#[test]
fn test_value_marker_sets_property() {
	let (input, component) = mount(r#"<input data-value-value="(name || '').toUpperCase()">"#, ());
	component.set_field("name", Value::from("abc")).unwrap();
	component.update().unwrap();
	assert_eq!(input.property("value"), Value::from("ABC"));
}

#[test]
fn test_later_marker_overwrites_slot() {
	let (p, component) = mount(r#"<p data-text="'first'" data-value-inner-text="'second'"></p>"#, ());
	assert_eq!(component.binding_count(), 1);
	assert_eq!(component.targets(&p), vec!["innerText"]);
	assert_eq!(p.text_content(), "second");
}

#[test]
fn test_unknown_targets_are_ignored() {
	let (div, component) = mount(
		r#"<div data-value-not-a-prop="){" data-on-not-an-event="){" data-text="'ok'"></div>"#,
		(),
	);
	assert_eq!(component.lifecycle(), Lifecycle::Ready);
	assert_eq!(component.binding_count(), 1);
	assert_eq!(div.text_content(), "ok");
}

#[rstest]
#[case(TraversalOrder::ReversedSiblings, "ba")]
#[case(TraversalOrder::Document, "ab")]
fn test_rule_order_follows_traversal(#[case] order: TraversalOrder, #[case] expected: &str) {
	let root = Element::from_markup(
		r#"<div><p data-value-title="{ this.log = (this.log || '') + 'a' }"></p><p data-value-title="{ this.log = (this.log || '') + 'b' }"></p></div>"#,
	)
	.unwrap();
	let config = Rc::new(EngineConfig::new().with_traversal(order));
	let component = Component::with_config(root, (), config);
	component.setup().unwrap();
	assert_eq!(component.field("log").unwrap(), Value::from(expected));
}

#[test]
fn test_handler_error_skips_update() {
	let (button, component) = mount(
		r#"<button data-on-click="{ this.clicked = true; missing.call() }" data-text="clicked"></button>"#,
		(),
	);
	let err = dispatch(&button, &Event::click()).unwrap_err();
	assert!(matches!(err, BindingError::Listener(_)));
	// Side effects before the failure stay, but no update pass ran.
	assert_eq!(component.field("clicked").unwrap(), Value::Bool(true));
	assert_eq!(button.text_content(), "");
}

proptest! {
	#[test]
	fn prop_update_is_idempotent(name in "[a-zA-Z ]{0,16}", flag in any::<bool>()) {
		let (form, component) = mount(
			r#"<form data-hidden="flag"><p data-text="name" data-value-title="name + '!'"></p><i data-html="(name || '').length"></i></form>"#,
			(),
		);
		component.set_field("name", Value::from(name.as_str())).unwrap();
		component.set_field("flag", Value::Bool(flag)).unwrap();
		component.update().unwrap();
		let first = form.outer_html();
		component.update().unwrap();
		prop_assert_eq!(form.outer_html(), first);
	}

	#[test]
	fn prop_value_marker_tracks_field(values in proptest::collection::vec(-1000i32..1000, 1..8)) {
		let (input, component) = mount(r#"<input data-value-value="n * 2">"#, ());
		for n in values {
			component.set_field("n", Value::from(n)).unwrap();
			component.update().unwrap();
			prop_assert_eq!(input.property("value"), Value::from((n * 2).to_string()));
		}
	}
}
