//! The binding table: element -> target -> update action.

use std::fmt;
use std::rc::Rc;

use datawire_dom::{Element, Value};
use datawire_expr::{EvalError, Locals, Rule, Scope};
use indexmap::IndexMap;

/// What a rule writes to on its element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleTarget {
	/// An element property (`value-<prop>`).
	Property(String),
	/// Text content (`text`).
	Text,
	/// Markup content (`html`).
	Html,
	/// An attribute (any other marker key).
	Attribute(String),
}

impl RuleTarget {
	/// Slot name in the table. `text` and `html` share their slots with the
	/// `innerText` and `innerHTML` properties, so whichever marker comes
	/// last on an element wins.
	pub fn key(&self) -> &str {
		match self {
			Self::Property(name) | Self::Attribute(name) => name,
			Self::Text => "innerText",
			Self::Html => "innerHTML",
		}
	}

	fn apply(&self, el: &Element, value: Value) -> Result<(), EvalError> {
		match self {
			Self::Property(name) => el.set_property(name, value)?,
			Self::Text => el.set_property("innerText", value)?,
			Self::Html => el.set_property("innerHTML", value)?,
			Self::Attribute(name) => match value {
				Value::Bool(true) => el.set_attribute(name, ""),
				Value::Bool(false) => {
					el.remove_attribute(name);
				}
				other => el.set_attribute(name, other.to_display_string()),
			},
		}
		Ok(())
	}
}

impl fmt::Display for RuleTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// A stored update: evaluates one rule against the component scope and
/// writes the result to one element.
pub struct UpdateAction {
	target: RuleTarget,
	run: Box<dyn Fn(&mut dyn Scope) -> Result<(), EvalError>>,
}

impl UpdateAction {
	/// Builds the action for `rule` writing to `target` on `el`.
	pub fn for_rule(el: &Element, target: RuleTarget, rule: Rc<Rule>) -> Self {
		let el = el.clone();
		let slot = target.clone();
		Self {
			target,
			run: Box::new(move |scope| {
				let value = rule.evaluate(scope, &Locals::new(el.clone()))?;
				slot.apply(&el, value)
			}),
		}
	}

	/// The target this action writes to.
	pub fn target(&self) -> &RuleTarget {
		&self.target
	}

	/// Runs the action.
	pub fn run(&self, scope: &mut dyn Scope) -> Result<(), EvalError> {
		(self.run)(scope)
	}
}

impl fmt::Debug for UpdateAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UpdateAction")
			.field("target", &self.target)
			.finish_non_exhaustive()
	}
}

/// Update actions keyed by element, then by target slot, both in discovery
/// order.
#[derive(Debug, Default)]
pub struct BindingTable {
	rows: IndexMap<Element, IndexMap<String, UpdateAction>>,
}

impl BindingTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `action` for `el`. A previous action in the same slot is
	/// replaced in place, keeping its position. Returns true if a slot was
	/// replaced.
	pub fn insert(&mut self, el: &Element, action: UpdateAction) -> bool {
		let key = action.target().key().to_string();
		self.rows
			.entry(el.clone())
			.or_default()
			.insert(key, action)
			.is_some()
	}

	/// Total number of actions.
	pub fn len(&self) -> usize {
		self.rows.values().map(IndexMap::len).sum()
	}

	/// Returns true if the table holds no actions.
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Number of elements with at least one action.
	pub fn element_count(&self) -> usize {
		self.rows.len()
	}

	/// Slot names for `el`, in order.
	pub fn targets(&self, el: &Element) -> Vec<&str> {
		self.rows
			.get(el)
			.map(|slots| slots.keys().map(String::as_str).collect())
			.unwrap_or_default()
	}

	/// Every action in table order.
	pub fn iter(&self) -> impl Iterator<Item = (&Element, &UpdateAction)> {
		self.rows
			.iter()
			.flat_map(|(el, slots)| slots.values().map(move |action| (el, action)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use datawire_expr::compile;
	use rstest::rstest;
	use std::collections::HashMap;

	fn action(el: &Element, target: RuleTarget, source: &str) -> UpdateAction {
		UpdateAction::for_rule(el, target, Rc::new(compile(source).unwrap()))
	}

	fn fields() -> HashMap<String, Value> {
		HashMap::new()
	}

	#[test]
	fn test_overwrite_keeps_position() {
		let el = Element::new("p");
		let mut table = BindingTable::new();
		assert!(!table.insert(&el, action(&el, RuleTarget::Text, "'a'")));
		assert!(!table.insert(&el, action(&el, RuleTarget::Attribute("title".into()), "'t'")));
		assert!(table.insert(
			&el,
			action(&el, RuleTarget::Property("innerText".into()), "'b'")
		));

		assert_eq!(table.len(), 2);
		assert_eq!(table.targets(&el), vec!["innerText", "title"]);

		let mut scope = fields();
		for (_, action) in table.iter() {
			action.run(&mut scope).unwrap();
		}
		assert_eq!(el.text_content(), "b");
	}

	#[test]
	fn test_elements_in_insertion_order() {
		let a = Element::new("a");
		let b = Element::new("b");
		let mut table = BindingTable::new();
		table.insert(&b, action(&b, RuleTarget::Text, "1"));
		table.insert(&a, action(&a, RuleTarget::Text, "2"));
		table.insert(&b, action(&b, RuleTarget::Attribute("x".into()), "3"));

		let order: Vec<String> = table.iter().map(|(el, _)| el.tag_name()).collect();
		assert_eq!(order, vec!["b", "b", "a"]);
		assert_eq!(table.element_count(), 2);
	}

	#[rstest]
	#[case("true", Some(""))]
	#[case("false", None)]
	#[case("'on'", Some("on"))]
	#[case("0", Some("0"))]
	#[case("null", Some("null"))]
	#[case("undefined", Some("undefined"))]
	fn test_attribute_target(#[case] source: &str, #[case] expected: Option<&str>) {
		let el = Element::from_markup(r#"<button disabled="x"></button>"#).unwrap();
		action(&el, RuleTarget::Attribute("disabled".into()), source)
			.run(&mut fields())
			.unwrap();
		assert_eq!(el.get_attribute("disabled").as_deref(), expected);
	}

	#[test]
	fn test_html_target_parses_markup() {
		let el = Element::new("div");
		action(&el, RuleTarget::Html, "'<b>hi</b>'")
			.run(&mut fields())
			.unwrap();
		assert_eq!(el.children().len(), 1);
		assert_eq!(el.text_content(), "hi");
	}

	#[test]
	fn test_read_only_property_fails() {
		let el = Element::new("div");
		let err = action(&el, RuleTarget::Property("tagName".into()), "'P'")
			.run(&mut fields())
			.unwrap_err();
		assert!(matches!(err, EvalError::Dom(_)));
	}
}
