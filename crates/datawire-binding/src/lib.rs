//! Datawire Binding - the declarative binding engine
//!
//! Scans a component root for `data-*` markers, compiles each marker into
//! a rule, and keeps the subtree in sync with a [`Model`] by recomputing
//! every rule on each update pass.
//!
//! ## Modules
//!
//! - [`marker`]: marker classification and name conversion
//! - [`scanner`]: subtree walk and marker compilation
//! - [`table`]: the binding table and update actions
//! - [`component`]: components, models and the lifecycle
//! - [`events`]: `input` and handler listeners
//! - [`runtime`]: the event loop that runs deferred setup
//! - [`application`]: bootstrap of registered component kinds
//! - [`config`]: engine settings
//!
//! ## Markers
//!
//! | Marker | Effect |
//! |---|---|
//! | `data-value-<prop>="expr"` | assigns `expr` to the property on every update |
//! | `data-bind-<prop>="field"` | copies the property into `field` on `input`, then updates |
//! | `data-on-<event>="stmt"` | runs `stmt` with `$event` and `$el` when the event fires, then updates |
//! | `data-text="expr"` | sets the text content |
//! | `data-html="expr"` | replaces the children with parsed markup |
//! | `data-<attr>="expr"` | `true`/`false` toggles the attribute, other values are written as text |
//!
//! ## Example
//!
//! ```
//! use datawire_binding::events::dispatch;
//! use datawire_binding::prelude::*;
//!
//! let root = Element::from_markup(
//!     r#"<form><input data-bind-value="username"><button data-disabled="!(username.length > 4)"></button></form>"#,
//! )
//! .unwrap();
//! let event_loop = EventLoop::new();
//! let component = Component::mount(root.clone(), (), &event_loop);
//! component.set_field("username", Value::from("")).unwrap();
//! event_loop.run_until_idle().unwrap();
//!
//! let children = root.children();
//! let (input, button) = (&children[0], &children[1]);
//! assert!(button.has_attribute("disabled"));
//!
//! input.set_property("value", Value::from("alice")).unwrap();
//! dispatch(input, &Event::input()).unwrap();
//! assert!(!button.has_attribute("disabled"));
//! ```

#![warn(missing_docs)]

pub mod application;
pub mod component;
pub mod config;
pub mod error;
pub mod events;
pub mod marker;
pub mod runtime;
pub mod scanner;
pub mod table;

pub use application::{Application, ApplicationBuilder};
pub use component::{Component, Lifecycle, Model, Mounted, WeakComponent};
pub use config::{EngineConfig, TraversalOrder, UpdateErrorPolicy};
pub use error::{BindingError, Result};
pub use runtime::EventLoop;

/// Common imports for hosts.
pub mod prelude {
	pub use crate::application::{Application, ApplicationBuilder};
	pub use crate::component::{Component, Lifecycle, Model, Mounted};
	pub use crate::config::{EngineConfig, TraversalOrder, UpdateErrorPolicy};
	pub use crate::error::BindingError;
	pub use crate::runtime::EventLoop;
	pub use datawire_dom::{Element, Event, Value};
	pub use datawire_expr::EvalError;
}
