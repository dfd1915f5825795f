//! Dynamic values shared by element properties and marker expressions.
//!
//! The conversions follow the loose rules markup authors expect from
//! inline handlers: `0`, `""`, `null`, `undefined` and `NaN` are falsy,
//! numbers print without a trailing `.0`, and `+` concatenates as soon as
//! one side is a string.

use std::fmt;

use crate::element::Element;
use crate::event::Event;

/// A dynamically typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	/// The value of a missing field or property.
	#[default]
	Undefined,
	/// An explicit empty value.
	Null,
	/// A boolean.
	Bool(bool),
	/// A double precision number.
	Number(f64),
	/// A string.
	String(String),
	/// A handle to an element (compared by identity).
	Element(Element),
	/// A handle to an event (compared by identity).
	Event(Event),
}

impl Value {
	/// Returns the `typeof` name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Undefined => "undefined",
			Value::Null | Value::Element(_) | Value::Event(_) => "object",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::String(_) => "string",
		}
	}

	/// Returns whether the value counts as true in a condition.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Undefined | Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::String(s) => !s.is_empty(),
			Value::Element(_) | Value::Event(_) => true,
		}
	}

	/// Returns true for `undefined` and `null`.
	pub fn is_nullish(&self) -> bool {
		matches!(self, Value::Undefined | Value::Null)
	}

	/// Numeric conversion (`Number(x)`).
	pub fn to_number(&self) -> f64 {
		match self {
			Value::Undefined => f64::NAN,
			Value::Null => 0.0,
			Value::Bool(b) => f64::from(u8::from(*b)),
			Value::Number(n) => *n,
			Value::String(s) => parse_number(s),
			Value::Element(_) | Value::Event(_) => f64::NAN,
		}
	}

	/// String conversion (`String(x)`).
	pub fn to_display_string(&self) -> String {
		self.to_string()
	}

	/// Borrows the string payload, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the boolean payload, if any.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the numeric payload, if any.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// Returns the element payload, if any.
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Value::Element(el) => Some(el),
			_ => None,
		}
	}

	/// Strict equality (`===`).
	pub fn strict_equals(&self, other: &Value) -> bool {
		self == other
	}

	/// Loose equality (`==`).
	///
	/// `null` and `undefined` only equal each other; a boolean is compared
	/// as a number; a number and a string are compared numerically.
	pub fn loose_equals(&self, other: &Value) -> bool {
		match (self, other) {
			(a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
			(Value::Bool(_), _) | (_, Value::Bool(_)) => {
				Value::Number(self.to_number()).loose_equals(&Value::Number(other.to_number()))
			}
			(Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
				self.to_number() == other.to_number()
			}
			_ => self == other,
		}
	}

	/// Converts to a JSON value. Elements and events have no JSON form and
	/// become `null`, as does a non-finite number.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Undefined | Value::Null | Value::Element(_) | Value::Event(_) => {
				serde_json::Value::Null
			}
			Value::Bool(b) => serde_json::Value::Bool(*b),
			Value::Number(n) => serde_json::Number::from_f64(*n)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Value::String(s) => serde_json::Value::String(s.clone()),
		}
	}
}

fn parse_number(s: &str) -> f64 {
	let trimmed = s.trim();
	match trimmed {
		"" => 0.0,
		"Infinity" | "+Infinity" => f64::INFINITY,
		"-Infinity" => f64::NEG_INFINITY,
		// Rust accepts "inf"/"nan" spellings that are not numbers here
		_ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
		_ => trimmed.parse().unwrap_or(f64::NAN),
	}
}

/// Formats a number the way string conversion prints it.
pub fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_string()
	} else if n.is_infinite() {
		if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
	} else if n == 0.0 {
		"0".to_string()
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		format!("{:.0}", n)
	} else {
		format!("{}", n)
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Null => f.write_str("null"),
			Value::Bool(b) => write!(f, "{}", b),
			Value::Number(n) => f.write_str(&format_number(*n)),
			Value::String(s) => f.write_str(s),
			Value::Element(_) => f.write_str("[object HTMLElement]"),
			Value::Event(_) => f.write_str("[object Event]"),
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(f64::from(n))
	}
}

impl From<u32> for Value {
	fn from(n: u32) -> Self {
		Value::Number(f64::from(n))
	}
}

impl From<usize> for Value {
	fn from(n: usize) -> Self {
		Value::Number(n as f64)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<Element> for Value {
	fn from(el: Element) -> Self {
		Value::Element(el)
	}
}

impl From<Event> for Value {
	fn from(ev: Event) -> Self {
		Value::Event(ev)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Value::Null, Into::into)
	}
}

impl From<serde_json::Value> for Value {
	/// Arrays and objects have no counterpart and are kept as their JSON text.
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Value::String(s),
			other => Value::String(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Value::Undefined, false)]
	#[case(Value::Null, false)]
	#[case(Value::Bool(false), false)]
	#[case(Value::Number(0.0), false)]
	#[case(Value::Number(f64::NAN), false)]
	#[case(Value::String(String::new()), false)]
	#[case(Value::Bool(true), true)]
	#[case(Value::Number(-1.5), true)]
	#[case(Value::String("0".into()), true)]
	fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(value.is_truthy(), expected);
	}

	#[rstest]
	#[case(3.0, "3")]
	#[case(-0.0, "0")]
	#[case(2.5, "2.5")]
	#[case(0.1 + 0.2, "0.30000000000000004")]
	#[case(f64::NAN, "NaN")]
	#[case(f64::INFINITY, "Infinity")]
	#[case(f64::NEG_INFINITY, "-Infinity")]
	#[case(1e20, "100000000000000000000")]
	fn test_format_number(#[case] n: f64, #[case] expected: &str) {
		assert_eq!(format_number(n), expected);
	}

	#[rstest]
	#[case("", 0.0)]
	#[case("  42 ", 42.0)]
	#[case("1e3", 1000.0)]
	#[case("-Infinity", f64::NEG_INFINITY)]
	fn test_string_to_number(#[case] s: &str, #[case] expected: f64) {
		assert_eq!(Value::from(s).to_number(), expected);
	}

	#[rstest]
	#[case("abc")]
	#[case("inf")]
	#[case("nan")]
	fn test_string_to_number_nan(#[case] s: &str) {
		assert!(Value::from(s).to_number().is_nan());
	}

	#[test]
	fn test_loose_equality() {
		assert!(Value::Null.loose_equals(&Value::Undefined));
		assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
		assert!(Value::from("5").loose_equals(&Value::from(5)));
		assert!(Value::Bool(true).loose_equals(&Value::from(1)));
		assert!(!Value::from("5").strict_equals(&Value::from(5)));
	}

	#[test]
	fn test_display() {
		assert_eq!(Value::Undefined.to_string(), "undefined");
		assert_eq!(Value::Null.to_string(), "null");
		assert_eq!(Value::Bool(true).to_string(), "true");
		assert_eq!(Value::from("hi").to_string(), "hi");
	}

	#[test]
	fn test_json_roundtrip_scalars() {
		let json = serde_json::json!({"n": 3, "s": "x", "b": true, "z": null});
		let obj = json.as_object().unwrap();
		assert_eq!(Value::from(obj["n"].clone()), Value::Number(3.0));
		assert_eq!(Value::from(obj["s"].clone()), Value::from("x"));
		assert_eq!(Value::from(obj["b"].clone()).to_json(), serde_json::json!(true));
		assert_eq!(Value::from(obj["z"].clone()), Value::Null);
		assert_eq!(Value::Undefined.to_json(), serde_json::Value::Null);
	}

	#[test]
	fn test_type_name() {
		assert_eq!(Value::Undefined.type_name(), "undefined");
		assert_eq!(Value::from(1).type_name(), "number");
		assert_eq!(Value::from("a").type_name(), "string");
		assert_eq!(Value::Null.type_name(), "object");
	}
}
