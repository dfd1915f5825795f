//! Compile and evaluation errors.

use datawire_dom::DomError;
use thiserror::Error;

/// A marker expression could not be compiled.
///
/// Raised for malformed syntax, use of an engine-reserved name, an
/// unknown `$` local, and assignments to anything but a field or an
/// element property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to compile `{expression}` at offset {offset}: {message}")]
pub struct CompileError {
	/// The full expression text as written in the marker.
	pub expression: String,
	/// Byte offset into `expression` where the problem was found.
	pub offset: usize,
	/// Human readable reason.
	pub message: String,
}

impl CompileError {
	pub(crate) fn new(expression: &str, offset: usize, message: impl Into<String>) -> Self {
		Self {
			expression: expression.to_string(),
			offset,
			message: message.into(),
		}
	}
}

/// Runtime failure while evaluating a compiled rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
	/// Member access on `undefined` or `null`.
	#[error("Cannot read properties of {base} (reading '{property}')")]
	NullMember {
		/// `"undefined"` or `"null"`.
		base: &'static str,
		/// The member being read, assigned or called.
		property: String,
	},

	/// The callee is not a function.
	#[error("{callee} is not a function")]
	NotCallable {
		/// Description of what was called.
		callee: String,
	},

	/// The component scope has no method of this name.
	#[error("Unknown method '{0}'")]
	UnknownMethod(String),

	/// The component scope refused an assignment.
	#[error("Field '{field}' rejected the assigned value: {reason}")]
	FieldRejected {
		/// The field being assigned.
		field: String,
		/// Why the value was refused.
		reason: String,
	},

	/// An element property could not be assigned.
	#[error(transparent)]
	Dom(#[from] DomError),

	/// Error raised by component code.
	#[error("{0}")]
	Component(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_compile_error_display() {
		let err = CompileError::new("){", 0, "expected expression");
		assert_eq!(
			err.to_string(),
			"Failed to compile `){` at offset 0: expected expression"
		);
	}

	#[test]
	fn test_eval_error_display() {
		let err = EvalError::NullMember {
			base: "undefined",
			property: "length".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"Cannot read properties of undefined (reading 'length')"
		);
	}

	#[test]
	fn test_eval_error_from_dom() {
		let err: EvalError = DomError::ReadOnlyProperty("tagName".to_string()).into();
		assert_eq!(err.to_string(), "Property 'tagName' is read-only");
	}
}
