//! Datawire Expr - the marker expression language
//!
//! Marker attributes carry small snippets of script:
//!
//! ```text
//! data-text="username.length"
//! data-disabled="!canSignup"
//! data-on-click="{ this.count = (this.count||0)+1 }"
//! ```
//!
//! [`compile`] parses such a snippet once into a [`Rule`]. A rule is then
//! evaluated any number of times against a [`Scope`] (the component's
//! fields and methods) and [`Locals`] (`$el`, and `$event` in handlers).
//!
//! The language is a small JavaScript subset: literals, field access,
//! arithmetic, comparison and logical operators, the conditional operator,
//! assignment to fields or element properties, `if`/`else` and `return` in
//! braced blocks, and a handful of built-in string, number, element and
//! event members. There are no loops, functions or object literals.
//!
//! ## Scoping
//!
//! A rule can only see what its scope and locals expose. Names the engine
//! uses for itself (see [`RESERVED_NAMES`]) are rejected at compile time,
//! so a marker cannot call `update()` or reach `root`.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use datawire_dom::{Element, Value};
//! use datawire_expr::{Locals, Scope, compile};
//!
//! let mut fields: HashMap<String, Value> = HashMap::new();
//! fields.assign("username", Value::from("abc")).unwrap();
//!
//! let rule = compile("username.length > 4 ? 'ok' : 'short'").unwrap();
//! let locals = Locals::new(Element::new("p"));
//! assert_eq!(rule.evaluate(&mut fields, &locals).unwrap(), Value::from("short"));
//! ```

#![warn(missing_docs)]

mod ast;
pub mod error;
mod eval;
mod members;
mod parser;
pub mod reserved;

use std::fmt;

pub use error::{CompileError, EvalError};
pub use eval::{Locals, Scope};
pub use reserved::{RESERVED_NAMES, is_reserved};

use datawire_dom::Value;

use crate::ast::Body;
use crate::eval::Evaluator;

/// A compiled marker expression.
#[derive(Clone)]
pub struct Rule {
	source: String,
	body: Body,
}

impl Rule {
	/// The expression text this rule was compiled from.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Returns true if the rule was compiled from a braced statement block.
	pub fn is_block(&self) -> bool {
		matches!(self.body, Body::Block(_))
	}

	/// Evaluates the rule.
	///
	/// A single-expression rule returns the expression's value; a block
	/// returns the value of the `return` statement it reached, or
	/// `undefined`.
	///
	/// # Errors
	///
	/// Returns an [`EvalError`] when evaluation fails, e.g. reading a member
	/// of `undefined` or calling a method the scope does not have. Side
	/// effects made before the failure are kept.
	pub fn evaluate(&self, scope: &mut dyn Scope, locals: &Locals) -> Result<Value, EvalError> {
		Evaluator::new(scope, locals).run(&self.body)
	}
}

impl fmt::Debug for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Rule").field(&self.source).finish()
	}
}

/// Compiles an expression or statement block.
///
/// Text that is brace-delimited after trimming is a statement block, so a
/// rule can run several statements and `return` a value. Any other text
/// is a single expression whose value is the result. Blank text compiles
/// to a rule that evaluates to `undefined`.
///
/// # Errors
///
/// Returns a [`CompileError`] with the byte offset of the problem for
/// malformed syntax, reserved names, unknown `$` locals and invalid
/// assignment targets.
///
/// # Example
///
/// ```
/// use datawire_expr::compile;
///
/// assert!(compile("{ this.count = (this.count||0)+1 }").is_ok());
///
/// let err = compile("){").unwrap_err();
/// assert_eq!(err.offset, 0);
///
/// let err = compile("this.update()").unwrap_err();
/// assert!(err.message.contains("reserved"));
/// ```
pub fn compile(expression: &str) -> Result<Rule, CompileError> {
	let body = parser::parse_body(expression).map_err(|err| {
		CompileError::new(
			expression,
			expression.len() - err.input.len(),
			err.message,
		)
	})?;
	tracing::trace!(expression, "compiled marker expression");
	Ok(Rule {
		source: expression.to_string(),
		body,
	})
}

/// Parses the field name of a two-way binding marker.
///
/// Accepts `name` or `this.name`; the text is a name, not an expression.
///
/// # Example
///
/// ```
/// use datawire_expr::parse_field_name;
///
/// assert_eq!(parse_field_name("this.username").unwrap(), "username");
/// assert!(parse_field_name("user.name").is_err());
/// ```
pub fn parse_field_name(text: &str) -> Result<String, CompileError> {
	parser::parse_field(text)
		.map_err(|err| CompileError::new(text, text.len() - err.input.len(), err.message))
}
