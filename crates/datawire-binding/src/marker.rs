//! Marker discovery and classification.
//!
//! A marker is a prefixed attribute such as `data-value-class-name`. The
//! key left after the prefix decides the category:
//!
//! | Key | Category |
//! |---|---|
//! | `value-<prop>` | one-way property |
//! | `bind-<prop>` | two-way on `input` |
//! | `on-<event>` | handler |
//! | `text` | text content |
//! | `html` | markup content |
//! | anything else | generic attribute |

use datawire_dom::Element;

use crate::config::EngineConfig;

/// Category of a marker, with the target it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
	/// `value-<prop>`: the expression's value is assigned to a property.
	Value {
		/// Property name, e.g. `className`.
		property: String,
	},
	/// `bind-<prop>`: the property is copied into a field on `input`.
	Bind {
		/// Property name, e.g. `value`.
		property: String,
	},
	/// `on-<event>`: the expression runs when the event fires.
	On {
		/// DOM event name, e.g. `keydown`.
		event: String,
	},
	/// `text`: the value becomes the element's text.
	Text,
	/// `html`: the value is parsed as the element's markup.
	Html,
	/// Any other key: a boolean toggles the attribute, anything else is
	/// written as its value.
	Attribute {
		/// Attribute name.
		name: String,
	},
}

/// One marker found on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
	/// Full attribute name, e.g. `data-bind-value`.
	pub attribute: String,
	/// Category and target.
	pub kind: MarkerKind,
	/// The attribute's value: an expression, or a field name for `bind-`.
	pub expression: String,
}

impl Marker {
	/// Returns true if the marker's target passes validation. Markers with
	/// unknown targets are skipped rather than reported.
	pub fn has_valid_target(&self, config: &EngineConfig) -> bool {
		match &self.kind {
			MarkerKind::Value { property } | MarkerKind::Bind { property } => {
				config.accepts_property(property)
			}
			MarkerKind::On { event } => config.accepts_event(event),
			MarkerKind::Text | MarkerKind::Html => true,
			MarkerKind::Attribute { name } => is_attribute_name(name),
		}
	}
}

/// Classifies a marker key (the attribute name without its prefix).
///
/// # Example
///
/// ```
/// use datawire_binding::marker::{MarkerKind, classify};
///
/// assert_eq!(
///     classify("value-inner-text"),
///     MarkerKind::Value { property: "innerText".to_string() }
/// );
/// assert_eq!(classify("on-key-down"), MarkerKind::On { event: "keydown".to_string() });
/// assert_eq!(classify("disabled"), MarkerKind::Attribute { name: "disabled".to_string() });
/// ```
pub fn classify(key: &str) -> MarkerKind {
	let key = key.to_ascii_lowercase();
	if let Some(rest) = key.strip_prefix("value-") {
		MarkerKind::Value {
			property: dash_to_camel(rest),
		}
	} else if let Some(rest) = key.strip_prefix("bind-") {
		MarkerKind::Bind {
			property: dash_to_camel(rest),
		}
	} else if let Some(rest) = key.strip_prefix("on-") {
		MarkerKind::On {
			event: dash_to_event(rest),
		}
	} else if key == "text" {
		MarkerKind::Text
	} else if key == "html" {
		MarkerKind::Html
	} else {
		MarkerKind::Attribute { name: key }
	}
}

/// `inner-text` -> `innerText`
pub fn dash_to_camel(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	let mut upper = false;
	for c in name.chars() {
		if c == '-' {
			upper = !out.is_empty();
		} else if upper {
			out.push(c.to_ascii_uppercase());
			upper = false;
		} else {
			out.push(c);
		}
	}
	out
}

/// `key-down` -> `keydown`
pub fn dash_to_event(name: &str) -> String {
	name.chars().filter(|c| *c != '-').collect()
}

fn is_attribute_name(name: &str) -> bool {
	!name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// Markers on `el`, in attribute order.
///
/// The component root marker (`data-component` by default) belongs to the
/// bootstrap and is not returned.
pub fn markers(el: &Element, config: &EngineConfig) -> Vec<Marker> {
	el.dataset(&config.marker_prefix)
		.into_iter()
		.filter(|(key, _)| !key.eq_ignore_ascii_case(&config.component_attribute))
		.map(|(key, expression)| Marker {
			attribute: format!("{}{}", config.marker_prefix, key),
			kind: classify(&key),
			expression,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("value-class-name", MarkerKind::Value { property: "className".to_string() })]
	#[case("value-value", MarkerKind::Value { property: "value".to_string() })]
	#[case("bind-value", MarkerKind::Bind { property: "value".to_string() })]
	#[case("bind-checked", MarkerKind::Bind { property: "checked".to_string() })]
	#[case("on-click", MarkerKind::On { event: "click".to_string() })]
	#[case("on-dbl-click", MarkerKind::On { event: "dblclick".to_string() })]
	#[case("text", MarkerKind::Text)]
	#[case("html", MarkerKind::Html)]
	#[case("value", MarkerKind::Attribute { name: "value".to_string() })]
	#[case("aria-label", MarkerKind::Attribute { name: "aria-label".to_string() })]
	#[case("TEXT", MarkerKind::Text)]
	fn test_classify(#[case] key: &str, #[case] expected: MarkerKind) {
		assert_eq!(classify(key), expected);
	}

	#[rstest]
	#[case("inner-text", "innerText")]
	#[case("read-only", "readOnly")]
	#[case("value", "value")]
	#[case("-x", "x")]
	#[case("a--b", "aB")]
	fn test_dash_to_camel(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(dash_to_camel(input), expected);
	}

	#[test]
	fn test_markers_skip_component_root() {
		let el = Element::from_markup(
			r#"<form data-component="signin" data-on-submit="save()" data-disabled="busy"></form>"#,
		)
		.unwrap();
		let found = markers(&el, &EngineConfig::default());
		assert_eq!(found.len(), 2);
		assert_eq!(found[0].attribute, "data-on-submit");
		assert_eq!(found[0].expression, "save()");
		assert_eq!(
			found[1].kind,
			MarkerKind::Attribute {
				name: "disabled".to_string()
			}
		);
	}

	#[test]
	fn test_custom_prefix() {
		let el = Element::from_markup(r#"<p x-text="a" data-text="b"></p>"#).unwrap();
		let found = markers(&el, &EngineConfig::new().with_marker_prefix("x-"));
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].expression, "a");
	}

	#[rstest]
	#[case("value-bogus-prop", false)]
	#[case("value-class-name", true)]
	#[case("bind-nope", false)]
	#[case("on-click", true)]
	#[case("on-explode", false)]
	#[case("value-", false)]
	#[case("text", true)]
	#[case("hidden", true)]
	fn test_valid_target(#[case] key: &str, #[case] valid: bool) {
		let marker = Marker {
			attribute: format!("data-{}", key),
			kind: classify(key),
			expression: String::new(),
		};
		assert_eq!(marker.has_valid_target(&EngineConfig::default()), valid);
	}
}
