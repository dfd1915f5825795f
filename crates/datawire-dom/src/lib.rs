//! Datawire DOM - in-memory element tree
//!
//! A single-threaded stand-in for the browser DOM, with just enough surface
//! for the binding engine: elements with ordered attributes and a property
//! store, text nodes, custom data attributes, event listeners with
//! synchronous dispatch, and markup parsing/serialization for `innerHTML`.
//!
//! ## Modules
//!
//! - [`element`]: element handles, attributes, properties, tree operations, dispatch
//! - [`event`]: events and listener types
//! - [`value`]: the dynamic [`Value`] shared by properties and expressions
//! - [`markup`]: fragment parser and serializer
//! - [`names`]: recognized property and event names
//!
//! ## Example
//!
//! ```
//! use datawire_dom::{Element, Event, Value};
//!
//! let input = Element::from_markup(r#"<input type="text" value="abc">"#).unwrap();
//! input.set_property("value", Value::from("abcde")).unwrap();
//! assert_eq!(input.property("value"), Value::from("abcde"));
//!
//! input.add_event_listener("input", |ev| {
//!     assert_eq!(ev.event_type(), "input");
//!     Ok(())
//! });
//! input.dispatch_event(&Event::input()).unwrap();
//! ```

#![warn(missing_docs)]

pub mod element;
pub mod error;
pub mod event;
pub mod markup;
pub mod names;
pub mod value;

pub use element::{Element, Node, WeakElement};
pub use error::{DomError, MarkupError};
pub use event::{Event, Listener, ListenerError, ListenerId};
pub use markup::{escape_attr, escape_text, parse_fragment};
pub use names::{is_known_event, is_known_property};
pub use value::{Value, format_number};
