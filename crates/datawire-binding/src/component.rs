//! Components
//!
//! A [`Component`] ties one root element to one [`Model`]: the model holds
//! the state that marker expressions read and write, the component owns
//! the binding table and the listeners wired into the root's subtree.
//!
//! ## Lifecycle
//!
//! ```text
//! Constructed --schedule--> Scheduled --setup--> Ready --disconnect--> Disconnected
//!                                         \
//!                                          `--(compile error)--> Failed
//! ```
//!
//! Setup is deferred through the [`EventLoop`] so that everything the host
//! does right after construction is visible to the first update pass.
//!
//! ## Example
//!
//! ```
//! use datawire_binding::prelude::*;
//!
//! let root = Element::from_markup(r#"<p data-text="username.length"></p>"#).unwrap();
//! let event_loop = EventLoop::new();
//! let component = Component::mount(root.clone(), (), &event_loop);
//! component.set_field("username", Value::from("abc")).unwrap();
//!
//! event_loop.run_until_idle().unwrap();
//! assert_eq!(component.lifecycle(), Lifecycle::Ready);
//! assert_eq!(root.text_content(), "3");
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use datawire_dom::{Element, Event, ListenerId, Value};
use datawire_expr::{EvalError, Locals, Rule, Scope};
use indexmap::IndexMap;

use crate::config::{EngineConfig, UpdateErrorPolicy};
use crate::error::{BindingError, Result};
use crate::events;
use crate::runtime::EventLoop;
use crate::scanner::{self, Binding};
use crate::table::{BindingTable, UpdateAction};

/// Where a component is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	/// Created, nothing scanned.
	Constructed,
	/// Setup is queued on an event loop.
	Scheduled,
	/// Bindings are installed and the first update pass has run.
	Ready,
	/// A marker failed to compile. Nothing was installed.
	Failed,
	/// Torn down. Terminal.
	Disconnected,
}

impl Lifecycle {
	/// Returns true for states no further update can leave.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Failed | Self::Disconnected)
	}
}

/// Host state behind a component.
///
/// Every method has a default, so `()` is a valid model whose fields all
/// live in the component's own field store. A model exposes named fields
/// (including computed, read-only ones), methods callable from marker
/// expressions, and lifecycle hooks.
pub trait Model: 'static {
	/// Reads a field the model declares. `None` means the model does not
	/// know the name, and the component's own field store is consulted.
	fn field(&self, name: &str) -> Option<Value> {
		let _ = name;
		None
	}

	/// Writes a field the model declares (one for which [`Model::field`]
	/// returns `Some`).
	///
	/// The default rejects the write, which suits computed fields.
	fn set_field(&mut self, name: &str, value: Value) -> std::result::Result<(), EvalError> {
		let _ = value;
		Err(EvalError::FieldRejected {
			field: name.to_string(),
			reason: "field is read-only".to_string(),
		})
	}

	/// Calls a method from a marker expression.
	fn call(&mut self, name: &str, args: Vec<Value>) -> std::result::Result<Value, EvalError> {
		let _ = args;
		Err(EvalError::UnknownMethod(name.to_string()))
	}

	/// Runs once after bindings are installed, before the first update pass.
	fn post_setup(&mut self) {}

	/// Runs at the start of every update pass.
	fn pre_update(&mut self) {}

	/// Runs at the end of every update pass that was not aborted.
	fn post_update(&mut self) {}

	/// Runs once when the component is disconnected.
	fn pre_disconnect(&mut self) {}
}

impl Model for () {}

/// A model plus the fields it does not declare.
struct ComponentState<M> {
	model: M,
	expando: IndexMap<String, Value>,
}

impl<M: Model> Scope for ComponentState<M> {
	fn lookup(&self, name: &str) -> Value {
		self.model
			.field(name)
			.or_else(|| self.expando.get(name).cloned())
			.unwrap_or_default()
	}

	fn assign(&mut self, name: &str, value: Value) -> std::result::Result<(), EvalError> {
		if self.model.field(name).is_some() {
			return self.model.set_field(name, value);
		}
		self.expando.insert(name.to_string(), value);
		Ok(())
	}

	fn invoke(&mut self, name: &str, args: Vec<Value>) -> std::result::Result<Value, EvalError> {
		self.model.call(name, args)
	}
}

struct ComponentInner<M> {
	root: Element,
	config: Rc<EngineConfig>,
	state: RefCell<ComponentState<M>>,
	table: RefCell<BindingTable>,
	lifecycle: Cell<Lifecycle>,
	listeners: RefCell<Vec<(Element, ListenerId)>>,
}

/// A component handle. Clones share the same component.
pub struct Component<M: Model> {
	inner: Rc<ComponentInner<M>>,
}

impl<M: Model> Clone for Component<M> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

/// A non-owning component handle, held by listeners and scheduled setup.
pub struct WeakComponent<M: Model> {
	inner: Weak<ComponentInner<M>>,
}

impl<M: Model> Clone for WeakComponent<M> {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl<M: Model> WeakComponent<M> {
	/// Returns the component if it is still alive.
	pub fn upgrade(&self) -> Option<Component<M>> {
		self.inner.upgrade().map(|inner| Component { inner })
	}
}

impl<M: Model> Component<M> {
	/// Creates a component with the default configuration. Nothing is
	/// scanned until [`Component::setup`] runs.
	pub fn new(root: Element, model: M) -> Self {
		Self::with_config(root, model, Rc::new(EngineConfig::default()))
	}

	/// Creates a component with a shared configuration.
	pub fn with_config(root: Element, model: M, config: Rc<EngineConfig>) -> Self {
		Self {
			inner: Rc::new(ComponentInner {
				root,
				config,
				state: RefCell::new(ComponentState {
					model,
					expando: IndexMap::new(),
				}),
				table: RefCell::new(BindingTable::new()),
				lifecycle: Cell::new(Lifecycle::Constructed),
				listeners: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Creates a component and schedules its setup on `event_loop`.
	pub fn mount(root: Element, model: M, event_loop: &EventLoop) -> Self {
		let component = Self::new(root, model);
		component.schedule(event_loop);
		component
	}

	/// Queues setup on `event_loop`. Does nothing unless the component is
	/// still [`Lifecycle::Constructed`].
	///
	/// The task holds only a weak handle; if every handle is dropped before
	/// it runs, it does nothing.
	pub fn schedule(&self, event_loop: &EventLoop) {
		if self.lifecycle() != Lifecycle::Constructed {
			return;
		}
		let weak = self.downgrade();
		event_loop.next_tick(move || match weak.upgrade() {
			Some(component) => component.setup(),
			None => Ok(()),
		});
		self.set_lifecycle(Lifecycle::Scheduled);
	}

	/// Scans the root, installs bindings and listeners, runs the
	/// `post_setup` hook and the first update pass.
	///
	/// Only a [`Lifecycle::Constructed`] or [`Lifecycle::Scheduled`]
	/// component is set up; in any other state this does nothing. In
	/// particular a component disconnected before its scheduled setup runs
	/// stays disconnected.
	///
	/// # Errors
	///
	/// A compile error leaves the component [`Lifecycle::Failed`] with
	/// nothing installed. Otherwise the component becomes
	/// [`Lifecycle::Ready`] and the result of the first update pass is
	/// returned.
	pub fn setup(&self) -> Result<()> {
		let state = self.lifecycle();
		if !matches!(state, Lifecycle::Constructed | Lifecycle::Scheduled) {
			tracing::debug!(root = %self.inner.root.tag_name(), ?state, "setup skipped");
			return Ok(());
		}

		let started = Instant::now();
		let bindings = match scanner::scan(&self.inner.root, &self.inner.config) {
			Ok(bindings) => bindings,
			Err(e) => {
				tracing::warn!(root = %self.inner.root.tag_name(), error = %e, "component setup failed");
				self.set_lifecycle(Lifecycle::Failed);
				return Err(e);
			}
		};
		self.install(bindings);
		self.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?
			.model
			.post_setup();

		tracing::debug!(
			root = %self.inner.root.tag_name(),
			rules = self.binding_count(),
			listeners = self.listener_count(),
			elapsed_us = started.elapsed().as_micros() as u64,
			"component setup"
		);

		let first_pass = self.update();
		self.set_lifecycle(Lifecycle::Ready);
		first_pass
	}

	fn install(&self, bindings: Vec<Binding>) {
		let mut table = self.inner.table.borrow_mut();
		let mut listeners = self.inner.listeners.borrow_mut();
		for binding in bindings {
			match binding {
				Binding::Rule {
					element,
					target,
					rule,
				} => {
					let key = target.key().to_string();
					if table.insert(&element, UpdateAction::for_rule(&element, target, rule)) {
						tracing::debug!(element = %element.tag_name(), target = %key, "marker replaced an earlier rule");
					}
				}
				Binding::Bind {
					element,
					property,
					field,
				} => {
					let listener = events::bind_listener(self.downgrade(), &element, property, field);
					let id = element.add_event_listener("input", listener);
					listeners.push((element, id));
				}
				Binding::Handler {
					element,
					event,
					rule,
				} => {
					let listener = events::handler_listener(self.downgrade(), &element, event.clone(), rule);
					let id = element.add_event_listener(&event, listener);
					listeners.push((element, id));
				}
			}
		}
	}

	/// Runs one update pass: `pre_update`, every rule in table order, then
	/// `post_update`.
	///
	/// Does nothing once the component is [`Lifecycle::Failed`] or
	/// [`Lifecycle::Disconnected`].
	///
	/// # Errors
	///
	/// [`BindingError::Eval`] for a failing rule. Under
	/// [`UpdateErrorPolicy::AbortPass`] the pass stops there and
	/// `post_update` is skipped; under [`UpdateErrorPolicy::Continue`] every
	/// rule runs and the first failure is returned.
	/// [`BindingError::Reentrant`] if called while the component's state is
	/// in use, e.g. from inside a model method.
	pub fn update(&self) -> Result<()> {
		if self.lifecycle().is_terminal() {
			return Ok(());
		}
		let started = Instant::now();
		let mut state = self
			.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?;
		let table = self
			.inner
			.table
			.try_borrow()
			.map_err(|_| BindingError::Reentrant)?;

		state.model.pre_update();
		let mut first_error = None;
		for (el, action) in table.iter() {
			let Err(source) = action.run(&mut *state) else {
				continue;
			};
			let err = BindingError::Eval {
				target: format!("<{}> {}", el.tag_name(), action.target()),
				source,
			};
			tracing::warn!(root = %self.inner.root.tag_name(), error = %err, "update rule failed");
			match self.inner.config.update_errors {
				UpdateErrorPolicy::AbortPass => return Err(err),
				UpdateErrorPolicy::Continue => {
					first_error.get_or_insert(err);
				}
			}
		}
		state.model.post_update();

		tracing::trace!(
			root = %self.inner.root.tag_name(),
			rules = table.len(),
			elapsed_us = started.elapsed().as_micros() as u64,
			"update pass"
		);
		first_error.map_or(Ok(()), Err)
	}

	/// Runs `pre_disconnect`, detaches every listener and moves to
	/// [`Lifecycle::Disconnected`]. Calling it again does nothing.
	///
	/// # Errors
	///
	/// [`BindingError::Reentrant`] if called while the component's state is
	/// in use.
	pub fn disconnect(&self) -> Result<()> {
		if self.lifecycle() == Lifecycle::Disconnected {
			return Ok(());
		}
		self.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?
			.model
			.pre_disconnect();
		for (el, id) in self.inner.listeners.borrow_mut().drain(..) {
			el.remove_event_listener(id);
		}
		self.set_lifecycle(Lifecycle::Disconnected);
		Ok(())
	}

	/// Current lifecycle state.
	pub fn lifecycle(&self) -> Lifecycle {
		self.inner.lifecycle.get()
	}

	fn set_lifecycle(&self, next: Lifecycle) {
		let previous = self.inner.lifecycle.replace(next);
		tracing::debug!(root = %self.inner.root.tag_name(), ?previous, ?next, "component lifecycle");
	}

	/// The root element.
	pub fn root(&self) -> &Element {
		&self.inner.root
	}

	/// The configuration this component scans with.
	pub fn config(&self) -> &EngineConfig {
		&self.inner.config
	}

	/// Reads the model.
	///
	/// # Errors
	///
	/// [`BindingError::Reentrant`] if the state is mutably borrowed.
	pub fn with_model<R>(&self, f: impl FnOnce(&M) -> R) -> Result<R> {
		let state = self
			.inner
			.state
			.try_borrow()
			.map_err(|_| BindingError::Reentrant)?;
		Ok(f(&state.model))
	}

	/// Mutates the model. No update pass runs; call [`Component::update`]
	/// afterwards.
	///
	/// # Errors
	///
	/// [`BindingError::Reentrant`] if the state is borrowed.
	pub fn with_model_mut<R>(&self, f: impl FnOnce(&mut M) -> R) -> Result<R> {
		let mut state = self
			.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?;
		Ok(f(&mut state.model))
	}

	/// Reads a field as marker expressions see it.
	///
	/// # Errors
	///
	/// [`BindingError::Reentrant`] if the state is mutably borrowed.
	pub fn field(&self, name: &str) -> Result<Value> {
		let state = self
			.inner
			.state
			.try_borrow()
			.map_err(|_| BindingError::Reentrant)?;
		Ok(state.lookup(name))
	}

	/// Writes a field as marker expressions would. No update pass runs.
	///
	/// # Errors
	///
	/// [`BindingError::Eval`] if the model rejects the write, and
	/// [`BindingError::Reentrant`] if the state is borrowed.
	pub fn set_field(&self, name: &str, value: Value) -> Result<()> {
		let mut state = self
			.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?;
		state.assign(name, value).map_err(|source| BindingError::Eval {
			target: name.to_string(),
			source,
		})
	}

	/// Runs a handler rule for `event` fired on `el`.
	pub(crate) fn run_handler(&self, el: &Element, rule: &Rule, event: &Event) -> Result<()> {
		let mut state = self
			.inner
			.state
			.try_borrow_mut()
			.map_err(|_| BindingError::Reentrant)?;
		let locals = Locals::new(el.clone()).with_event(event.clone());
		rule.evaluate(&mut *state, &locals)
			.map(|_| ())
			.map_err(|source| BindingError::Eval {
				target: format!("<{}> on{}", el.tag_name(), event.event_type()),
				source,
			})
	}

	/// Number of installed update rules.
	pub fn binding_count(&self) -> usize {
		self.inner.table.borrow().len()
	}

	/// Number of attached listeners.
	pub fn listener_count(&self) -> usize {
		self.inner.listeners.borrow().len()
	}

	/// Slot names with a rule on `el`, in update order.
	pub fn targets(&self, el: &Element) -> Vec<String> {
		self.inner
			.table
			.borrow()
			.targets(el)
			.into_iter()
			.map(str::to_string)
			.collect()
	}

	/// A weak handle.
	pub fn downgrade(&self) -> WeakComponent<M> {
		WeakComponent {
			inner: Rc::downgrade(&self.inner),
		}
	}
}

impl<M: Model> fmt::Debug for Component<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("root", &self.inner.root.tag_name())
			.field("lifecycle", &self.lifecycle())
			.field("rules", &self.binding_count())
			.field("listeners", &self.listener_count())
			.finish()
	}
}

/// Object-safe view of a component of any model type.
pub trait Mounted {
	/// The root element.
	fn root(&self) -> &Element;

	/// Current lifecycle state.
	fn lifecycle(&self) -> Lifecycle;

	/// Queues setup on `event_loop`.
	fn schedule(&self, event_loop: &EventLoop);

	/// Scans and installs bindings, then runs the first update pass.
	fn setup(&self) -> Result<()>;

	/// Runs one update pass.
	fn update(&self) -> Result<()>;

	/// Tears the component down.
	fn disconnect(&self) -> Result<()>;

	/// For downcasting to a concrete `Component<M>`.
	fn as_any(&self) -> &dyn Any;
}

impl<M: Model> Mounted for Component<M> {
	fn root(&self) -> &Element {
		Component::root(self)
	}

	fn lifecycle(&self) -> Lifecycle {
		Component::lifecycle(self)
	}

	fn schedule(&self, event_loop: &EventLoop) {
		Component::schedule(self, event_loop)
	}

	fn setup(&self) -> Result<()> {
		Component::setup(self)
	}

	fn update(&self) -> Result<()> {
		Component::update(self)
	}

	fn disconnect(&self) -> Result<()> {
		Component::disconnect(self)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::TraversalOrder;
	use rstest::rstest;

	#[derive(Default)]
	struct Counter {
		count: f64,
		pre: u32,
		post: u32,
		disconnected: u32,
	}

	impl Model for Counter {
		fn field(&self, name: &str) -> Option<Value> {
			match name {
				"count" => Some(Value::Number(self.count)),
				"double" => Some(Value::Number(self.count * 2.0)),
				_ => None,
			}
		}

		fn set_field(&mut self, name: &str, value: Value) -> std::result::Result<(), EvalError> {
			match name {
				"count" => {
					self.count = value.to_number();
					Ok(())
				}
				_ => Err(EvalError::FieldRejected {
					field: name.to_string(),
					reason: "computed".to_string(),
				}),
			}
		}

		fn pre_update(&mut self) {
			self.pre += 1;
		}

		fn post_update(&mut self) {
			self.post += 1;
		}

		fn pre_disconnect(&mut self) {
			self.disconnected += 1;
		}
	}

	fn component(markup: &str) -> Component<Counter> {
		Component::new(Element::from_markup(markup).unwrap(), Counter::default())
	}

	#[test]
	fn test_setup_runs_first_pass() {
		let c = component(r#"<p data-text="double"></p>"#);
		c.set_field("count", Value::from(4)).unwrap();
		c.setup().unwrap();
		assert_eq!(c.lifecycle(), Lifecycle::Ready);
		assert_eq!(c.root().text_content(), "8");
		assert_eq!(c.with_model(|m| (m.pre, m.post)).unwrap(), (1, 1));
	}

	#[test]
	fn test_schedule_defers_setup() {
		let event_loop = EventLoop::new();
		let c = component(r#"<p data-text="count"></p>"#);
		c.schedule(&event_loop);
		assert_eq!(c.lifecycle(), Lifecycle::Scheduled);
		assert_eq!(c.root().text_content(), "");

		c.with_model_mut(|m| m.count = 7.0).unwrap();
		event_loop.run_until_idle().unwrap();
		assert_eq!(c.root().text_content(), "7");
	}

	#[test]
	fn test_schedule_twice_queues_once() {
		let event_loop = EventLoop::new();
		let c = component("<p></p>");
		c.schedule(&event_loop);
		c.schedule(&event_loop);
		assert_eq!(event_loop.pending(), 1);
	}

	#[test]
	fn test_dropped_before_setup() {
		let event_loop = EventLoop::new();
		drop(Component::mount(Element::new("p"), (), &event_loop));
		assert_eq!(event_loop.run_until_idle().unwrap(), 1);
	}

	#[test]
	fn test_expando_fields() {
		let c = Component::new(Element::new("p"), ());
		assert_eq!(c.field("count").unwrap(), Value::Undefined);
		c.set_field("count", Value::from(1)).unwrap();
		assert_eq!(c.field("count").unwrap(), Value::from(1));
	}

	#[test]
	fn test_computed_field_rejects_write() {
		let c = component("<p></p>");
		let err = c.set_field("double", Value::from(1)).unwrap_err();
		assert!(matches!(err, BindingError::Eval { .. }));
	}

	#[rstest]
	#[case(UpdateErrorPolicy::AbortPass, "", 0)]
	#[case(UpdateErrorPolicy::Continue, "ok", 1)]
	fn test_update_error_policy(
		#[case] policy: UpdateErrorPolicy,
		#[case] later_text: &str,
		#[case] post_updates: u32,
	) {
		let config = EngineConfig::new()
			.with_traversal(TraversalOrder::Document)
			.with_update_errors(policy);
		let root = Element::from_markup(
			r#"<div><p data-text="missing.name"></p><b data-text="'ok'"></b></div>"#,
		)
		.unwrap();
		let c = Component::with_config(root.clone(), Counter::default(), Rc::new(config));

		let err = c.setup().unwrap_err();
		assert!(matches!(err, BindingError::Eval { ref target, .. } if target == "<p> innerText"));
		assert_eq!(c.lifecycle(), Lifecycle::Ready);
		assert_eq!(root.children()[1].text_content(), later_text);
		assert_eq!(c.with_model(|m| m.post).unwrap(), post_updates);
	}

	#[test]
	fn test_disconnect_is_terminal() {
		let c = component(r#"<button data-on-click="count = count + 1" data-text="count"></button>"#);
		c.setup().unwrap();
		assert_eq!(c.listener_count(), 1);

		c.disconnect().unwrap();
		c.disconnect().unwrap();
		assert_eq!(c.lifecycle(), Lifecycle::Disconnected);
		assert_eq!(c.root().listener_count("click"), 0);
		assert_eq!(c.with_model(|m| m.disconnected).unwrap(), 1);

		c.set_field("count", Value::from(5)).unwrap();
		c.update().unwrap();
		assert_eq!(c.root().text_content(), "0");
		c.setup().unwrap();
		assert_eq!(c.lifecycle(), Lifecycle::Disconnected);
	}

	#[test]
	fn test_reentrant_update_is_reported() {
		let c = component("<p></p>");
		let inner = c.clone();
		let result = c.with_model_mut(|_| inner.update()).unwrap();
		assert!(matches!(result, Err(BindingError::Reentrant)));
	}

	#[test]
	fn test_mounted_downcast() {
		let c = component("<p></p>");
		let mounted: Rc<dyn Mounted> = Rc::new(c.clone());
		let back = mounted.as_any().downcast_ref::<Component<Counter>>().unwrap();
		assert!(back.root().ptr_eq(c.root()));
		assert_eq!(mounted.lifecycle(), Lifecycle::Constructed);
	}
}
