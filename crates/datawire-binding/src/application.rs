//! Application bootstrap.
//!
//! An [`ApplicationBuilder`] maps component names to model factories.
//! Binding it to a document root finds every `data-component="<name>"`
//! element, mounts a component on it and strips the attribute.
//!
//! ```
//! use datawire_binding::prelude::*;
//!
//! let document = Element::from_markup(
//!     r#"<main><p data-component="greeting" data-text="'hi ' + who"></p></main>"#,
//! )
//! .unwrap();
//!
//! let event_loop = EventLoop::new();
//! let app = ApplicationBuilder::new()
//!     .register("greeting", |_root: &Element| ())
//!     .bind(&document, &event_loop);
//! assert_eq!(app.len(), 1);
//!
//! let root = document.children()[0].clone();
//! app.component::<()>(&root)
//!     .unwrap()
//!     .set_field("who", Value::from("there"))
//!     .unwrap();
//! event_loop.run_until_idle().unwrap();
//! assert_eq!(root.text_content(), "hi there");
//! assert!(!root.has_attribute("data-component"));
//! ```

use std::fmt;
use std::rc::Rc;

use datawire_dom::Element;
use indexmap::IndexMap;

use crate::component::{Component, Model, Mounted};
use crate::config::EngineConfig;
use crate::runtime::EventLoop;

type Factory = Box<dyn Fn(&Element, Rc<EngineConfig>) -> Rc<dyn Mounted>>;

/// Registry of component kinds, consumed by [`ApplicationBuilder::bind`].
pub struct ApplicationBuilder {
	config: Rc<EngineConfig>,
	factories: IndexMap<String, Factory>,
}

impl Default for ApplicationBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ApplicationBuilder {
	/// Creates a builder with the default configuration.
	pub fn new() -> Self {
		Self {
			config: Rc::new(EngineConfig::default()),
			factories: IndexMap::new(),
		}
	}

	/// Uses `config` for every component this builder mounts.
	pub fn with_config(mut self, config: EngineConfig) -> Self {
		self.config = Rc::new(config);
		self
	}

	/// Registers a component kind. `factory` builds the model from the
	/// root element. Registering a name again replaces the factory but
	/// keeps its original position.
	pub fn register<M, F>(mut self, name: impl Into<String>, factory: F) -> Self
	where
		M: Model,
		F: Fn(&Element) -> M + 'static,
	{
		let factory: Factory = Box::new(move |root: &Element, config: Rc<EngineConfig>| {
			let component: Rc<dyn Mounted> =
				Rc::new(Component::with_config(root.clone(), factory(root), config));
			component
		});
		self.factories.insert(name.into(), factory);
		self
	}

	/// Names registered so far, in registration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.factories.keys().map(String::as_str)
	}

	/// Mounts every registered kind under `root` and schedules their setup
	/// on `event_loop`.
	///
	/// Kinds are processed in registration order, and elements of one kind
	/// in document order. The root-selection attribute is removed from each
	/// mounted element, so binding the same document twice mounts nothing
	/// new.
	pub fn bind(self, root: &Element, event_loop: &EventLoop) -> Application {
		let attribute = self.config.component_selector();
		let mut components: IndexMap<Element, Rc<dyn Mounted>> = IndexMap::new();
		for (name, factory) in &self.factories {
			for el in root.find_by_attribute(&attribute, Some(name.as_str())) {
				let component = factory(&el, Rc::clone(&self.config));
				component.schedule(event_loop);
				el.remove_attribute(&attribute);
				components.insert(el, component);
			}
			tracing::debug!(component = %name, "bound component kind");
		}
		tracing::debug!(components = components.len(), "application bound");
		Application { components }
	}
}

impl fmt::Debug for ApplicationBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApplicationBuilder")
			.field("config", &self.config)
			.field("names", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Mounted components keyed by root element.
pub struct Application {
	components: IndexMap<Element, Rc<dyn Mounted>>,
}

impl Application {
	/// Number of mounted components.
	pub fn len(&self) -> usize {
		self.components.len()
	}

	/// Returns true if nothing is mounted.
	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}

	/// The component mounted on `root`.
	pub fn get(&self, root: &Element) -> Option<&Rc<dyn Mounted>> {
		self.components.get(root)
	}

	/// The component mounted on `root`, if its model is `M`.
	pub fn component<M: Model>(&self, root: &Element) -> Option<Component<M>> {
		self.get(root)?
			.as_any()
			.downcast_ref::<Component<M>>()
			.cloned()
	}

	/// Every mounted component in mount order.
	pub fn iter(&self) -> impl Iterator<Item = (&Element, &Rc<dyn Mounted>)> {
		self.components.iter()
	}

	/// Disconnects every component and forgets them all.
	///
	/// Every component is disconnected even if one fails; the first error
	/// is returned.
	pub fn shutdown(&mut self) -> crate::error::Result<()> {
		let mut first_error = None;
		for (root, component) in self.components.drain(..) {
			if let Err(e) = component.disconnect() {
				tracing::warn!(root = %root.tag_name(), error = %e, "disconnect failed");
				first_error.get_or_insert(e);
			}
		}
		tracing::debug!("application shut down");
		first_error.map_or(Ok(()), Err)
	}
}

impl fmt::Debug for Application {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Application")
			.field("components", &self.components.len())
			.finish()
	}
}
