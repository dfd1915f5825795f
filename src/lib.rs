//! # Datawire
//!
//! A declarative binding engine for small interactive widgets.
//!
//! Markup declares how elements follow state through `data-*` attributes;
//! a component scans its root once, compiles every marker into a rule, and
//! recomputes every rule on each update. There is no virtual DOM and no
//! dependency graph: widgets are small enough that recomputing everything
//! is simple and deterministic.
//!
//! ## Crates
//!
//! - [`dom`]: the in-memory element tree the engine binds to
//! - [`expr`]: the marker expression language
//! - [`binding`]: scanner, binding table, update cycle, components and bootstrap
//!
//! ## Quick Example
//!
//! ```
//! use datawire::prelude::*;
//!
//! struct Greeter {
//!     name: String,
//! }
//!
//! impl Model for Greeter {
//!     fn field(&self, name: &str) -> Option<Value> {
//!         (name == "name").then(|| Value::from(self.name.as_str()))
//!     }
//!
//!     fn set_field(&mut self, _name: &str, value: Value) -> Result<(), EvalError> {
//!         self.name = value.to_display_string();
//!         Ok(())
//!     }
//! }
//!
//! let document = Element::from_markup(
//!     r#"<main>
//!         <form data-component="greeter">
//!             <input data-bind-value="name">
//!             <p data-text="'Hello, ' + name + '!'"></p>
//!         </form>
//!     </main>"#,
//! )
//! .unwrap();
//!
//! let event_loop = EventLoop::new();
//! let _app = ApplicationBuilder::new()
//!     .register("greeter", |_root: &Element| Greeter { name: "world".into() })
//!     .bind(&document, &event_loop);
//! event_loop.run_until_idle().unwrap();
//!
//! let form = &document.children()[0];
//! let (input, greeting) = (&form.children()[0], &form.children()[1]);
//! assert_eq!(greeting.text_content(), "Hello, world!");
//!
//! input.set_property("value", Value::from("datawire")).unwrap();
//! dispatch(input, &Event::input()).unwrap();
//! assert_eq!(greeting.text_content(), "Hello, datawire!");
//! ```

pub mod binding;
pub mod dom;
pub mod expr;

pub use datawire_binding::{
	Application, ApplicationBuilder, BindingError, Component, EngineConfig, EventLoop, Lifecycle,
	Model, Mounted, TraversalOrder, UpdateErrorPolicy,
};
pub use datawire_dom::{Element, Event, Value};
pub use datawire_expr::{CompileError, EvalError, Rule, compile};

/// Everything a host application usually needs.
pub mod prelude {
	pub use datawire_binding::events::dispatch;
	pub use datawire_binding::prelude::*;
}
