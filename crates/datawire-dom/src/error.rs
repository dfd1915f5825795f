//! Error types for the element tree.

use thiserror::Error;

/// Errors raised by element operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
	/// The property exists but cannot be assigned.
	#[error("Property '{0}' is read-only")]
	ReadOnlyProperty(String),

	/// Appending the node would make an element its own ancestor.
	#[error("Cannot insert <{child}> into <{parent}>: the new child is an ancestor of the parent")]
	HierarchyRequest {
		/// Tag of the element receiving the child.
		parent: String,
		/// Tag of the rejected child.
		child: String,
	},

	/// Markup assigned through `innerHTML` could not be parsed.
	#[error(transparent)]
	Markup(#[from] MarkupError),
}

/// Error produced when a markup fragment is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed markup at offset {offset}: {message}")]
pub struct MarkupError {
	/// Byte offset into the source where parsing stopped.
	pub offset: usize,
	/// Human readable reason.
	pub message: String,
}

impl MarkupError {
	pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
		Self {
			offset,
			message: message.into(),
		}
	}
}
