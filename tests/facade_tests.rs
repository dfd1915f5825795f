//! Tests for the `datawire` facade crate

use datawire::prelude::*;
use rstest::rstest;

#[test]
fn test_reexports_compose() {
	let root = datawire::dom::Element::from_markup(r#"<p data-text="greeting"></p>"#).unwrap();
	let component = datawire::Component::new(root.clone(), ());
	component
		.set_field("greeting", datawire::Value::from("hello"))
		.unwrap();
	component.setup().unwrap();
	assert_eq!(root.text_content(), "hello");
}

#[rstest]
#[case("1 + 2 * 3", Value::from(7))]
#[case("'a' + 1", Value::from("a1"))]
#[case("!''", Value::Bool(true))]
fn test_compile_through_facade(#[case] source: &str, #[case] expected: Value) {
	let rule = datawire::compile(source).unwrap();
	let mut scope = std::collections::HashMap::<String, Value>::new();
	let locals = datawire::expr::Locals::new(Element::new("p"));
	assert_eq!(rule.evaluate(&mut scope, &locals).unwrap(), expected);
}

#[test]
fn test_config_from_toml_drives_bootstrap() {
	let config = EngineConfig::from_toml_str(
		r#"
		marker_prefix = "x-"
		traversal = "document"
		"#,
	)
	.unwrap();
	let document =
		Element::from_markup(r#"<main><button x-component="clicker" x-on-click="{ this.n = (this.n || 0) + 1 }" x-text="n"></button></main>"#)
			.unwrap();
	let event_loop = EventLoop::new();
	let app = ApplicationBuilder::new()
		.with_config(config)
		.register("clicker", |_root: &Element| ())
		.bind(&document, &event_loop);
	event_loop.run_until_idle().unwrap();

	let button = document.children()[0].clone();
	dispatch(&button, &Event::click()).unwrap();
	dispatch(&button, &Event::click()).unwrap();
	assert_eq!(button.text_content(), "2");
	assert_eq!(app.component::<()>(&button).unwrap().lifecycle(), Lifecycle::Ready);
}
