//! Built-in members of strings, numbers, elements and events.

use datawire_dom::{Value, format_number};

use crate::error::EvalError;

fn null_member(base: &Value, property: &str) -> EvalError {
	EvalError::NullMember {
		base: if matches!(base, Value::Null) {
			"null"
		} else {
			"undefined"
		},
		property: property.to_string(),
	}
}

/// `object.property`
pub(crate) fn get_member(object: &Value, property: &str) -> Result<Value, EvalError> {
	match object {
		Value::Undefined | Value::Null => Err(null_member(object, property)),
		Value::String(s) if property == "length" => Ok(Value::from(s.encode_utf16().count())),
		Value::Element(el) => Ok(el.property(property)),
		Value::Event(ev) => Ok(match property {
			"type" => Value::from(ev.event_type()),
			"target" => ev.target().map(Value::Element).unwrap_or(Value::Null),
			"detail" => ev.detail().clone(),
			"defaultPrevented" => Value::Bool(ev.default_prevented()),
			_ => Value::Undefined,
		}),
		_ => Ok(Value::Undefined),
	}
}

/// `object[index]`
pub(crate) fn get_index(object: &Value, index: &Value) -> Result<Value, EvalError> {
	match (object, index) {
		// Indexes by UTF-16 unit, the same unit `length` counts. Half of a
		// surrogate pair reads as U+FFFD.
		(Value::String(s), Value::Number(n)) => {
			let found = (n.fract() == 0.0 && *n >= 0.0)
				.then(|| s.encode_utf16().nth(*n as usize))
				.flatten();
			Ok(found
				.map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
				.unwrap_or_default())
		}
		_ => get_member(object, &index.to_display_string()),
	}
}

fn string_arg(args: &[Value], at: usize) -> String {
	args.get(at).map(Value::to_display_string).unwrap_or_else(|| "undefined".to_string())
}

/// `object.method(args)`
pub(crate) fn call_method(object: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
	let result = match (object, method) {
		(Value::Undefined | Value::Null, _) => return Err(null_member(object, method)),
		(_, "toString") => Value::String(object.to_display_string()),
		(Value::String(s), "trim") => Value::from(s.trim()),
		(Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
		(Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
		(Value::String(s), "includes") => Value::Bool(s.contains(string_arg(args, 0).as_str())),
		(Value::String(s), "startsWith") => Value::Bool(s.starts_with(string_arg(args, 0).as_str())),
		(Value::String(s), "endsWith") => Value::Bool(s.ends_with(string_arg(args, 0).as_str())),
		(Value::Number(n), "toFixed") => {
			let digits = args.first().map(Value::to_number).unwrap_or(0.0);
			let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
			if n.is_finite() {
				Value::String(format!("{:.*}", digits, n))
			} else {
				Value::String(format_number(*n))
			}
		}
		(Value::Element(el), "getAttribute") => el
			.get_attribute(&string_arg(args, 0))
			.map(Value::String)
			.unwrap_or(Value::Null),
		(Value::Element(el), "hasAttribute") => Value::Bool(el.has_attribute(&string_arg(args, 0))),
		(Value::Event(ev), "preventDefault") => {
			ev.prevent_default();
			Value::Undefined
		}
		_ => {
			return Err(EvalError::NotCallable {
				callee: format!("{}.{}", object.type_name(), method),
			});
		}
	};
	Ok(result)
}
