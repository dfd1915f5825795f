//! Evaluation of compiled rules against a component scope.
//!
//! Name resolution has two levels. `$el` and `$event` come from the
//! [`Locals`] passed to each evaluation; every other name is looked up in
//! the [`Scope`], which is the component. Nothing else is reachable.

use std::collections::HashMap;

use datawire_dom::{Element, Event, Value};

use crate::ast::{AssignOp, BinaryOp, Body, Expr, Literal, Local, Stmt, Target, UnaryOp};
use crate::error::EvalError;
use crate::members::{call_method, get_index, get_member};

/// The component side of an expression's scope.
///
/// Implemented by the binding engine for its components; the `HashMap`
/// implementation is a plain bag of fields with no methods.
pub trait Scope {
	/// Reads a field. Unknown names read as `undefined`.
	fn lookup(&self, name: &str) -> Value;

	/// Writes a field.
	fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError>;

	/// Calls a component method.
	fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError>;
}

impl Scope for HashMap<String, Value> {
	fn lookup(&self, name: &str) -> Value {
		self.get(name).cloned().unwrap_or_default()
	}

	fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
		self.insert(name.to_string(), value);
		Ok(())
	}

	fn invoke(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, EvalError> {
		Err(EvalError::UnknownMethod(name.to_string()))
	}
}

/// Values injected as `$el` and `$event`.
///
/// `$event` is only set while a handler runs; rules evaluated by an update
/// pass see it as `undefined`.
#[derive(Debug, Clone, Default)]
pub struct Locals {
	el: Option<Element>,
	event: Option<Event>,
}

impl Locals {
	/// Locals for a rule owned by `el`.
	pub fn new(el: Element) -> Self {
		Self {
			el: Some(el),
			event: None,
		}
	}

	/// Adds the triggering event.
	pub fn with_event(mut self, event: Event) -> Self {
		self.event = Some(event);
		self
	}

	/// The bound element.
	pub fn el(&self) -> Option<&Element> {
		self.el.as_ref()
	}

	/// The triggering event, if any.
	pub fn event(&self) -> Option<&Event> {
		self.event.as_ref()
	}
}

enum Flow {
	Normal,
	Return(Value),
}

pub(crate) struct Evaluator<'a> {
	scope: &'a mut dyn Scope,
	locals: &'a Locals,
}

impl<'a> Evaluator<'a> {
	pub(crate) fn new(scope: &'a mut dyn Scope, locals: &'a Locals) -> Self {
		Self { scope, locals }
	}

	pub(crate) fn run(&mut self, body: &Body) -> Result<Value, EvalError> {
		match body {
			Body::Expression(expr) => self.eval(expr),
			Body::Block(stmts) => match self.exec_all(stmts)? {
				Flow::Return(value) => Ok(value),
				Flow::Normal => Ok(Value::Undefined),
			},
		}
	}

	fn exec_all(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalError> {
		for stmt in stmts {
			if let Flow::Return(value) = self.exec(stmt)? {
				return Ok(Flow::Return(value));
			}
		}
		Ok(Flow::Normal)
	}

	fn exec(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
		match stmt {
			Stmt::Expression(expr) => {
				self.eval(expr)?;
				Ok(Flow::Normal)
			}
			Stmt::Return(expr) => {
				let value = match expr {
					Some(expr) => self.eval(expr)?,
					None => Value::Undefined,
				};
				Ok(Flow::Return(value))
			}
			Stmt::If {
				test,
				consequent,
				alternate,
			} => {
				if self.eval(test)?.is_truthy() {
					self.exec(consequent)
				} else if let Some(alternate) = alternate {
					self.exec(alternate)
				} else {
					Ok(Flow::Normal)
				}
			}
			Stmt::Block(stmts) => self.exec_all(stmts),
		}
	}

	fn local(&self, local: Local) -> Value {
		match local {
			Local::El => self.locals.el.clone().map(Value::Element).unwrap_or_default(),
			Local::Event => self.locals.event.clone().map(Value::Event).unwrap_or_default(),
		}
	}

	fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
		match expr {
			Expr::Literal(literal) => Ok(match literal {
				Literal::Undefined => Value::Undefined,
				Literal::Null => Value::Null,
				Literal::Bool(b) => Value::Bool(*b),
				Literal::Number(n) => Value::Number(*n),
				Literal::String(s) => Value::String(s.clone()),
			}),
			Expr::Field(name) => Ok(self.scope.lookup(name)),
			Expr::Local(local) => Ok(self.local(*local)),
			Expr::Member { object, property } => {
				let object = self.eval(object)?;
				get_member(&object, property)
			}
			Expr::Index { object, index } => {
				let object = self.eval(object)?;
				let index = self.eval(index)?;
				get_index(&object, &index)
			}
			Expr::Call { callee, args } => self.call(callee, args),
			Expr::Unary { op, operand } => {
				let operand = self.eval(operand)?;
				Ok(match op {
					UnaryOp::Not => Value::Bool(!operand.is_truthy()),
					UnaryOp::Neg => Value::Number(-operand.to_number()),
					UnaryOp::Plus => Value::Number(operand.to_number()),
					UnaryOp::Typeof => Value::from(operand.type_name()),
				})
			}
			Expr::Binary { op, left, right } => self.binary(*op, left, right),
			Expr::Conditional {
				test,
				consequent,
				alternate,
			} => {
				if self.eval(test)?.is_truthy() {
					self.eval(consequent)
				} else {
					self.eval(alternate)
				}
			}
			Expr::Assign { op, target, value } => {
				let assigned = match op {
					AssignOp::Assign => self.eval(value)?,
					AssignOp::Add => {
						let current = self.read_target(target)?;
						add(&current, &self.eval(value)?)
					}
					AssignOp::Sub => {
						let current = self.read_target(target)?;
						Value::Number(current.to_number() - self.eval(value)?.to_number())
					}
				};
				self.write_target(target, assigned.clone())?;
				Ok(assigned)
			}
		}
	}

	fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, EvalError> {
		match callee {
			Expr::Field(name) => {
				let args = self.eval_args(args)?;
				self.scope.invoke(name, args)
			}
			Expr::Member { object, property } => {
				let object = self.eval(object)?;
				let args = self.eval_args(args)?;
				call_method(&object, property, &args)
			}
			other => {
				let value = self.eval(other)?;
				Err(EvalError::NotCallable {
					callee: value.type_name().to_string(),
				})
			}
		}
	}

	fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
		args.iter().map(|arg| self.eval(arg)).collect()
	}

	fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, EvalError> {
		let left = self.eval(left)?;
		match op {
			BinaryOp::And if !left.is_truthy() => return Ok(left),
			BinaryOp::Or if left.is_truthy() => return Ok(left),
			BinaryOp::Coalesce if !left.is_nullish() => return Ok(left),
			BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => return self.eval(right),
			_ => {}
		}
		let right = self.eval(right)?;
		Ok(match op {
			BinaryOp::Add => add(&left, &right),
			BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
			BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
			BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
			BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
			BinaryOp::Lt => Value::Bool(compare(&left, &right, |o| o.is_lt())),
			BinaryOp::Le => Value::Bool(compare(&left, &right, |o| o.is_le())),
			BinaryOp::Gt => Value::Bool(compare(&left, &right, |o| o.is_gt())),
			BinaryOp::Ge => Value::Bool(compare(&left, &right, |o| o.is_ge())),
			BinaryOp::StrictEq => Value::Bool(left.strict_equals(&right)),
			BinaryOp::StrictNe => Value::Bool(!left.strict_equals(&right)),
			BinaryOp::LooseEq => Value::Bool(left.loose_equals(&right)),
			BinaryOp::LooseNe => Value::Bool(!left.loose_equals(&right)),
			BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => right,
		})
	}

	fn read_target(&mut self, target: &Target) -> Result<Value, EvalError> {
		match target {
			Target::Field(name) => Ok(self.scope.lookup(name)),
			Target::ElementProperty(property) => get_member(&self.local(Local::El), property),
		}
	}

	fn write_target(&mut self, target: &Target, value: Value) -> Result<(), EvalError> {
		match target {
			Target::Field(name) => self.scope.assign(name, value),
			Target::ElementProperty(property) => match &self.locals.el {
				Some(el) => Ok(el.set_property(property, value)?),
				None => Err(EvalError::NullMember {
					base: "undefined",
					property: property.clone(),
				}),
			},
		}
	}
}

/// `+`: string concatenation as soon as either side is not a primitive
/// number-like value, numeric addition otherwise.
fn add(left: &Value, right: &Value) -> Value {
	let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Element(_) | Value::Event(_));
	if stringy(left) || stringy(right) {
		Value::String(format!("{}{}", left, right))
	} else {
		Value::Number(left.to_number() + right.to_number())
	}
}

/// Relational comparison: strings compare lexically, anything else
/// numerically, and any comparison involving `NaN` is false.
fn compare(left: &Value, right: &Value, accept: fn(std::cmp::Ordering) -> bool) -> bool {
	if let (Value::String(a), Value::String(b)) = (left, right) {
		return accept(a.cmp(b));
	}
	left.to_number()
		.partial_cmp(&right.to_number())
		.is_some_and(accept)
}
