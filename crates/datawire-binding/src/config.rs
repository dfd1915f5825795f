//! Engine configuration.
//!
//! Everything has a default matching plain `data-*` markup, so most
//! applications never build one explicitly. A TOML form is accepted for
//! hosts that keep settings in a file:
//!
//! ```toml
//! marker_prefix = "data-"
//! traversal = "document"
//! update_errors = "continue"
//! extra_properties = ["ariaLabel"]
//! ```

use datawire_dom::{is_known_event, is_known_property};
use serde::{Deserialize, Serialize};

use crate::error::{BindingError, Result};

/// Order in which the scanner visits a component's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalOrder {
	/// Stack walk that pushes children in document order and pops the last
	/// one first, so siblings are visited last to first. Parents are always
	/// visited before their children.
	#[default]
	ReversedSiblings,
	/// Strict document (pre-)order.
	Document,
}

/// What an update pass does when a rule fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateErrorPolicy {
	/// Stop at the failing rule. Later rules keep their stale output and
	/// the post-update hook does not run.
	#[default]
	AbortPass,
	/// Run every rule and the post-update hook, then report the first
	/// failure.
	Continue,
}

/// Binding engine settings.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Attribute prefix that marks a binding, `data-` by default.
	pub marker_prefix: String,

	/// Marker key naming a component root, `component` by default
	/// (so `data-component="signin"`).
	pub component_attribute: String,

	/// Scanner visit order.
	pub traversal: TraversalOrder,

	/// Update pass failure handling.
	pub update_errors: UpdateErrorPolicy,

	/// Property names accepted in addition to the built-in table.
	pub extra_properties: Vec<String>,

	/// Event names accepted in addition to the built-in table.
	pub extra_events: Vec<String>,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			marker_prefix: "data-".to_string(),
			component_attribute: "component".to_string(),
			traversal: TraversalOrder::default(),
			update_errors: UpdateErrorPolicy::default(),
			extra_properties: Vec::new(),
			extra_events: Vec::new(),
		}
	}
}

impl EngineConfig {
	/// Creates the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the marker prefix.
	pub fn with_marker_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.marker_prefix = prefix.into();
		self
	}

	/// Sets the component root marker key.
	pub fn with_component_attribute(mut self, key: impl Into<String>) -> Self {
		self.component_attribute = key.into();
		self
	}

	/// Sets the scanner visit order.
	pub fn with_traversal(mut self, traversal: TraversalOrder) -> Self {
		self.traversal = traversal;
		self
	}

	/// Sets the update pass failure policy.
	pub fn with_update_errors(mut self, policy: UpdateErrorPolicy) -> Self {
		self.update_errors = policy;
		self
	}

	/// Accepts an additional property name as a marker target.
	pub fn with_extra_property(mut self, name: impl Into<String>) -> Self {
		self.extra_properties.push(name.into());
		self
	}

	/// Accepts an additional event name as a marker target.
	pub fn with_extra_event(mut self, name: impl Into<String>) -> Self {
		self.extra_events.push(name.into());
		self
	}

	/// Parses configuration from a TOML string. Missing keys keep their
	/// defaults.
	///
	/// # Errors
	///
	/// Returns [`BindingError::Config`] if the TOML is malformed or a value
	/// has the wrong type.
	pub fn from_toml_str(content: &str) -> Result<Self> {
		toml::from_str(content).map_err(|e| BindingError::Config(e.to_string()))
	}

	/// Full attribute name of the component root marker, e.g. `data-component`.
	pub fn component_selector(&self) -> String {
		format!("{}{}", self.marker_prefix, self.component_attribute)
	}

	/// Returns true if `name` may be the target of a `value-` or `bind-` marker.
	pub fn accepts_property(&self, name: &str) -> bool {
		is_known_property(name) || self.extra_properties.iter().any(|p| p == name)
	}

	/// Returns true if `name` may be the target of an `on-` marker.
	pub fn accepts_event(&self, name: &str) -> bool {
		is_known_event(name) || self.extra_events.iter().any(|e| e == name)
	}
}
