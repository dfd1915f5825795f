//! Error types for the binding engine.

use datawire_expr::{CompileError, EvalError};
use thiserror::Error;

/// Errors raised while setting up or updating a component.
#[derive(Debug, Error)]
pub enum BindingError {
	/// A marker expression failed to compile. Fatal to the component's setup.
	#[error("Invalid `{marker}` marker on <{element}>: {source}")]
	Compile {
		/// Tag of the element carrying the marker.
		element: String,
		/// Full attribute name, e.g. `data-text`.
		marker: String,
		/// The compile failure.
		#[source]
		source: CompileError,
	},

	/// A rule or handler failed while running.
	#[error("Evaluating `{target}` failed: {source}")]
	Eval {
		/// What was being evaluated, e.g. `<p> innerText`.
		target: String,
		/// The evaluation failure.
		#[source]
		source: EvalError,
	},

	/// The component was re-entered while its state was already in use.
	#[error("Component re-entered while an update or handler was running")]
	Reentrant,

	/// An event listener failed during dispatch.
	#[error("Event listener failed: {0}")]
	Listener(String),

	/// Engine configuration could not be parsed.
	#[error("Invalid engine configuration: {0}")]
	Config(String),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, BindingError>;
