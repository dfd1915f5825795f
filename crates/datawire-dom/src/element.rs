//! Element handles and tree operations.
//!
//! An [`Element`] is a reference-counted handle; cloning it yields another
//! handle to the same node, and equality and hashing use node identity.
//! This is what lets the binding table key its rows by element.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{DomError, MarkupError};
use crate::event::{Event, Listener, ListenerError, ListenerId};
use crate::markup;
use crate::names::{PropertyKind, property_kind};
use crate::value::Value;

/// Most elements carry one or two listeners in practice
const TYPICAL_LISTENER_COUNT: usize = 2;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	/// An element node.
	Element(Element),
	/// A text node.
	Text(String),
}

impl From<Element> for Node {
	fn from(el: Element) -> Self {
		Node::Element(el)
	}
}

impl From<&str> for Node {
	fn from(text: &str) -> Self {
		Node::Text(text.to_string())
	}
}

impl From<String> for Node {
	fn from(text: String) -> Self {
		Node::Text(text)
	}
}

struct Registration {
	id: ListenerId,
	event_type: String,
	listener: Listener,
}

pub(crate) struct ElementData {
	tag: String,
	attributes: IndexMap<String, String>,
	properties: HashMap<String, Value>,
	children: Vec<Node>,
	parent: Weak<RefCell<ElementData>>,
	listeners: Vec<Registration>,
	next_listener_id: u64,
}

/// Handle to an element.
#[derive(Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

/// Non-owning handle to an element, for listeners that must not keep
/// their own element alive.
#[derive(Clone)]
pub struct WeakElement(Weak<RefCell<ElementData>>);

impl WeakElement {
	/// Returns the element if it is still alive.
	pub fn upgrade(&self) -> Option<Element> {
		self.0.upgrade().map(Element)
	}
}

impl fmt::Debug for WeakElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("WeakElement")
	}
}

impl Element {
	/// Creates a detached element. The tag is stored lower-cased.
	pub fn new(tag: &str) -> Self {
		Self(Rc::new(RefCell::new(ElementData {
			tag: tag.to_ascii_lowercase(),
			attributes: IndexMap::new(),
			properties: HashMap::new(),
			children: Vec::new(),
			parent: Weak::new(),
			listeners: Vec::with_capacity(TYPICAL_LISTENER_COUNT),
			next_listener_id: 0,
		})))
	}

	/// Parses markup containing exactly one root element.
	///
	/// Whitespace around the root is ignored; any other top-level text or a
	/// second root element is an error.
	///
	/// # Example
	///
	/// ```
	/// use datawire_dom::Element;
	///
	/// let form = Element::from_markup(r#"<form><input name="user"></form>"#).unwrap();
	/// assert_eq!(form.children().len(), 1);
	/// ```
	pub fn from_markup(source: &str) -> Result<Self, MarkupError> {
		let mut root = None;
		for node in markup::parse_fragment(source)? {
			match node {
				Node::Text(text) if text.trim().is_empty() => {}
				Node::Text(_) => {
					return Err(MarkupError::new(0, "text outside of the root element"));
				}
				Node::Element(el) => {
					if root.is_some() {
						return Err(MarkupError::new(0, "more than one root element"));
					}
					root = Some(el);
				}
			}
		}
		root.ok_or_else(|| MarkupError::new(source.len(), "no root element"))
	}

	/// Returns a weak handle to this element.
	pub fn downgrade(&self) -> WeakElement {
		WeakElement(Rc::downgrade(&self.0))
	}

	/// Returns true if both handles point to the same element.
	pub fn ptr_eq(&self, other: &Element) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// The lower-cased tag name, e.g. `"input"`.
	pub fn tag_name(&self) -> String {
		self.0.borrow().tag.clone()
	}

	// ------------------------------------------------------------------
	// Attributes
	// ------------------------------------------------------------------

	/// Returns the value of an attribute.
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		self.0
			.borrow()
			.attributes
			.get(&name.to_ascii_lowercase())
			.cloned()
	}

	/// Sets an attribute, keeping its position if it already exists.
	pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
		self.0
			.borrow_mut()
			.attributes
			.insert(name.to_ascii_lowercase(), value.into());
	}

	/// Removes an attribute, returning its previous value.
	pub fn remove_attribute(&self, name: &str) -> Option<String> {
		self.0
			.borrow_mut()
			.attributes
			.shift_remove(&name.to_ascii_lowercase())
	}

	/// Returns true if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.0
			.borrow()
			.attributes
			.contains_key(&name.to_ascii_lowercase())
	}

	/// All attributes in insertion order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		self.0
			.borrow()
			.attributes
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Custom data attributes: every attribute starting with `prefix`,
	/// keyed by the remainder of its name, in attribute order.
	///
	/// ```
	/// use datawire_dom::Element;
	///
	/// let el = Element::from_markup(r#"<p id="a" data-text="name"></p>"#).unwrap();
	/// assert_eq!(el.dataset("data-"), vec![("text".to_string(), "name".to_string())]);
	/// ```
	pub fn dataset(&self, prefix: &str) -> Vec<(String, String)> {
		self.0
			.borrow()
			.attributes
			.iter()
			.filter_map(|(name, value)| {
				name.strip_prefix(prefix)
					.filter(|key| !key.is_empty())
					.map(|key| (key.to_string(), value.clone()))
			})
			.collect()
	}

	// ------------------------------------------------------------------
	// Properties
	// ------------------------------------------------------------------

	/// Reads a property.
	///
	/// Reflected properties read their attribute, `value`/`checked`/`selected`
	/// fall back to their attribute until assigned, and unknown names read
	/// whatever was stored under them (or `undefined`).
	pub fn property(&self, name: &str) -> Value {
		match property_kind(name) {
			Some(PropertyKind::ReflectString(attr)) => {
				Value::String(self.get_attribute(attr).unwrap_or_default())
			}
			Some(PropertyKind::ReflectBool(attr)) => Value::Bool(self.has_attribute(attr)),
			Some(PropertyKind::Live { attribute, boolean }) => {
				let stored = self.0.borrow().properties.get(name).cloned();
				match stored {
					Some(value) => value,
					None if boolean => Value::Bool(self.has_attribute(attribute)),
					None => Value::String(self.get_attribute(attribute).unwrap_or_default()),
				}
			}
			Some(PropertyKind::Text) => Value::String(self.text_content()),
			Some(PropertyKind::Html) => Value::String(self.inner_html()),
			Some(PropertyKind::TagName) => Value::String(self.tag_name().to_ascii_uppercase()),
			Some(PropertyKind::Plain) | None => self
				.0
				.borrow()
				.properties
				.get(name)
				.cloned()
				.unwrap_or_default(),
		}
	}

	/// Assigns a property.
	///
	/// # Errors
	///
	/// Returns [`DomError::ReadOnlyProperty`] for `tagName` and
	/// [`DomError::Markup`] when `innerHTML` receives malformed markup.
	pub fn set_property(&self, name: &str, value: Value) -> Result<(), DomError> {
		match property_kind(name) {
			Some(PropertyKind::ReflectString(attr)) => {
				self.set_attribute(attr, value.to_display_string());
			}
			Some(PropertyKind::ReflectBool(attr)) => {
				if value.is_truthy() {
					self.set_attribute(attr, "");
				} else {
					self.remove_attribute(attr);
				}
			}
			Some(PropertyKind::Live { boolean, .. }) => {
				let stored = if boolean {
					Value::Bool(value.is_truthy())
				} else {
					Value::String(text_of(&value))
				};
				self.0
					.borrow_mut()
					.properties
					.insert(name.to_string(), stored);
			}
			Some(PropertyKind::Text) => self.set_text_content(&text_of(&value)),
			Some(PropertyKind::Html) => self.set_inner_html(&text_of(&value))?,
			Some(PropertyKind::TagName) => {
				return Err(DomError::ReadOnlyProperty(name.to_string()));
			}
			Some(PropertyKind::Plain) | None => {
				self.0
					.borrow_mut()
					.properties
					.insert(name.to_string(), value);
			}
		}
		Ok(())
	}

	// ------------------------------------------------------------------
	// Tree
	// ------------------------------------------------------------------

	/// Appends a child node. An element that already has a parent is moved.
	///
	/// # Errors
	///
	/// Returns [`DomError::HierarchyRequest`] if `node` is this element or
	/// one of its ancestors.
	pub fn append_child(&self, node: impl Into<Node>) -> Result<(), DomError> {
		match node.into() {
			Node::Element(child) => {
				if child.contains(self) {
					return Err(DomError::HierarchyRequest {
						parent: self.tag_name(),
						child: child.tag_name(),
					});
				}
				child.remove();
				child.0.borrow_mut().parent = Rc::downgrade(&self.0);
				self.0.borrow_mut().children.push(Node::Element(child));
			}
			Node::Text(text) => self.0.borrow_mut().children.push(Node::Text(text)),
		}
		Ok(())
	}

	/// Returns true if `other` is this element or one of its descendants.
	pub fn contains(&self, other: &Element) -> bool {
		let mut current = Some(other.clone());
		while let Some(el) = current {
			if el.ptr_eq(self) {
				return true;
			}
			current = el.parent();
		}
		false
	}

	/// The parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.0.borrow().parent.upgrade().map(Element)
	}

	/// Detaches this element from its parent.
	pub fn remove(&self) {
		if let Some(parent) = self.parent() {
			parent
				.0
				.borrow_mut()
				.children
				.retain(|node| !matches!(node, Node::Element(el) if el.ptr_eq(self)));
		}
		self.0.borrow_mut().parent = Weak::new();
	}

	/// Element children in document order.
	pub fn children(&self) -> Vec<Element> {
		self.0
			.borrow()
			.children
			.iter()
			.filter_map(|node| match node {
				Node::Element(el) => Some(el.clone()),
				Node::Text(_) => None,
			})
			.collect()
	}

	/// All child nodes, including text.
	pub fn child_nodes(&self) -> Vec<Node> {
		self.0.borrow().children.clone()
	}

	/// Every descendant element in document (pre-)order, excluding `self`.
	pub fn descendants(&self) -> Vec<Element> {
		let mut out = Vec::new();
		let mut stack: Vec<Element> = self.children().into_iter().rev().collect();
		while let Some(el) = stack.pop() {
			stack.extend(el.children().into_iter().rev());
			out.push(el);
		}
		out
	}

	/// Descendants carrying attribute `name`, optionally with an exact value.
	pub fn find_by_attribute(&self, name: &str, value: Option<&str>) -> Vec<Element> {
		self.descendants()
			.into_iter()
			.filter(|el| match (el.get_attribute(name), value) {
				(Some(actual), Some(expected)) => actual == expected,
				(Some(_), None) => true,
				(None, _) => false,
			})
			.collect()
	}

	fn replace_children(&self, nodes: Vec<Node>) -> Result<(), DomError> {
		let old = std::mem::take(&mut self.0.borrow_mut().children);
		for node in old {
			if let Node::Element(el) = node {
				el.0.borrow_mut().parent = Weak::new();
			}
		}
		for node in nodes {
			self.append_child(node)?;
		}
		Ok(())
	}

	/// Concatenated text of all descendant text nodes.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		collect_text(&self.child_nodes(), &mut out);
		out
	}

	/// Replaces all children with a single text node.
	pub fn set_text_content(&self, text: &str) {
		let nodes = if text.is_empty() {
			Vec::new()
		} else {
			vec![Node::Text(text.to_string())]
		};
		// Text nodes cannot create a cycle.
		let _ = self.replace_children(nodes);
	}

	/// Serialized markup of the children.
	pub fn inner_html(&self) -> String {
		markup::serialize_nodes(&self.child_nodes())
	}

	/// Parses `source` and replaces the children with the result.
	pub fn set_inner_html(&self, source: &str) -> Result<(), DomError> {
		let nodes = markup::parse_fragment(source)?;
		self.replace_children(nodes)
	}

	/// Serialized markup of this element including itself.
	pub fn outer_html(&self) -> String {
		markup::serialize_nodes(&[Node::Element(self.clone())])
	}

	pub(crate) fn with_data<R>(&self, f: impl FnOnce(&str, &IndexMap<String, String>, &[Node]) -> R) -> R {
		let data = self.0.borrow();
		f(&data.tag, &data.attributes, &data.children)
	}

	// ------------------------------------------------------------------
	// Events
	// ------------------------------------------------------------------

	/// Registers a listener for `event_type`.
	pub fn add_event_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
	where
		F: Fn(&Event) -> Result<(), ListenerError> + 'static,
	{
		let mut data = self.0.borrow_mut();
		let id = ListenerId(data.next_listener_id);
		data.next_listener_id += 1;
		data.listeners.push(Registration {
			id,
			event_type: event_type.to_string(),
			listener: Rc::new(listener),
		});
		id
	}

	/// Removes a listener. Returns false if it was not registered.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		let mut data = self.0.borrow_mut();
		let before = data.listeners.len();
		data.listeners.retain(|reg| reg.id != id);
		data.listeners.len() != before
	}

	/// Number of listeners registered for `event_type`.
	pub fn listener_count(&self, event_type: &str) -> usize {
		self.0
			.borrow()
			.listeners
			.iter()
			.filter(|reg| reg.event_type == event_type)
			.count()
	}

	/// Dispatches `event` to this element's listeners for its type, in
	/// registration order.
	///
	/// The listener list is snapshotted first, so listeners may freely
	/// mutate this element (or register further listeners, which only see
	/// later dispatches). Dispatch stops at the first listener error.
	pub fn dispatch_event(&self, event: &Event) -> Result<(), ListenerError> {
		event.set_target(self);
		let listeners: Vec<Listener> = self
			.0
			.borrow()
			.listeners
			.iter()
			.filter(|reg| reg.event_type == event.event_type())
			.map(|reg| Rc::clone(&reg.listener))
			.collect();
		for listener in listeners {
			listener(event)?;
		}
		Ok(())
	}
}

fn text_of(value: &Value) -> String {
	if value.is_nullish() {
		String::new()
	} else {
		value.to_display_string()
	}
}

fn collect_text(nodes: &[Node], out: &mut String) {
	for node in nodes {
		match node {
			Node::Text(text) => out.push_str(text),
			Node::Element(el) => collect_text(&el.child_nodes(), out),
		}
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Element {}

impl Hash for Element {
	fn hash<H: Hasher>(&self, state: &mut H) {
		Rc::as_ptr(&self.0).hash(state);
	}
}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let data = self.0.borrow();
		f.debug_struct("Element")
			.field("tag", &data.tag)
			.field("attributes", &data.attributes)
			.finish()
	}
}
