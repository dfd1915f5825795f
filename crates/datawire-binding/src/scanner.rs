//! Marker scanner.
//!
//! Walks a component root, classifies every marker and compiles its
//! expression. The scan is all-or-nothing: it returns the complete list of
//! bindings or the first compile error, and installs nothing itself.

use std::rc::Rc;

use datawire_dom::Element;
use datawire_expr::{Rule, compile, parse_field_name};

use crate::config::{EngineConfig, TraversalOrder};
use crate::error::{BindingError, Result};
use crate::marker::{Marker, MarkerKind, markers};
use crate::table::RuleTarget;

/// One compiled marker, ready to install.
#[derive(Debug, Clone)]
pub enum Binding {
	/// A rule recomputed on every update.
	Rule {
		/// Element carrying the marker.
		element: Element,
		/// Where the result goes.
		target: RuleTarget,
		/// The compiled expression.
		rule: Rc<Rule>,
	},
	/// A two-way binding: on `input`, `property` is copied into `field`.
	Bind {
		/// Element carrying the marker.
		element: Element,
		/// Property read from the element.
		property: String,
		/// Component field written.
		field: String,
	},
	/// An event handler.
	Handler {
		/// Element carrying the marker.
		element: Element,
		/// DOM event name.
		event: String,
		/// The compiled handler.
		rule: Rc<Rule>,
	},
}

/// Elements under (and including) `root` in scan order.
///
/// Parents always come before their children. With
/// [`TraversalOrder::ReversedSiblings`] the walk pops the most recently
/// pushed child first, so siblings come out last to first.
pub fn visit_order(root: &Element, order: TraversalOrder) -> Vec<Element> {
	let mut visited = Vec::new();
	let mut stack = vec![root.clone()];
	while let Some(el) = stack.pop() {
		let children = el.children();
		match order {
			TraversalOrder::ReversedSiblings => stack.extend(children),
			TraversalOrder::Document => stack.extend(children.into_iter().rev()),
		}
		visited.push(el);
	}
	visited
}

/// Scans `root` and compiles every marker with a valid target.
///
/// # Errors
///
/// Returns [`BindingError::Compile`] for the first marker whose expression
/// (or `bind-` field name) does not compile.
pub fn scan(root: &Element, config: &EngineConfig) -> Result<Vec<Binding>> {
	let mut bindings = Vec::new();
	for el in visit_order(root, config.traversal) {
		for marker in markers(&el, config) {
			if !marker.has_valid_target(config) {
				tracing::debug!(
					element = %el.tag_name(),
					marker = %marker.attribute,
					"skipping marker with unknown target"
				);
				continue;
			}
			bindings.push(compile_marker(&el, marker)?);
		}
	}
	Ok(bindings)
}

fn compile_marker(el: &Element, marker: Marker) -> Result<Binding> {
	let Marker {
		attribute,
		kind,
		expression,
	} = marker;
	let compile_error = |source| BindingError::Compile {
		element: el.tag_name(),
		marker: attribute.clone(),
		source,
	};

	let target = match kind {
		MarkerKind::Bind { property } => {
			return Ok(Binding::Bind {
				element: el.clone(),
				property,
				field: parse_field_name(&expression).map_err(compile_error)?,
			});
		}
		MarkerKind::On { event } => {
			return Ok(Binding::Handler {
				element: el.clone(),
				event,
				rule: Rc::new(compile(&expression).map_err(compile_error)?),
			});
		}
		MarkerKind::Value { property } => RuleTarget::Property(property),
		MarkerKind::Text => RuleTarget::Text,
		MarkerKind::Html => RuleTarget::Html,
		MarkerKind::Attribute { name } => RuleTarget::Attribute(name),
	};
	Ok(Binding::Rule {
		element: el.clone(),
		target,
		rule: Rc::new(compile(&expression).map_err(compile_error)?),
	})
}
