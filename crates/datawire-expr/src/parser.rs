//! Marker expression parser built from nom combinators.
//!
//! Each precedence level is its own function, lowest first:
//! assignment, conditional, `??`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix, primary.
//!
//! Semantic checks that only make sense with a position (reserved names,
//! unknown locals, invalid assignment targets) are raised here as
//! `nom::Err::Failure` so the reported offset points at the offending token.

use std::borrow::Cow;
use std::cell::Cell;

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_while},
	character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
	combinator::{cut, eof, map, map_opt, not, opt, recognize, value},
	error::{ContextError, ErrorKind, ParseError, context},
	multi::{fold_many0, many0, separated_list0},
	sequence::{delimited, pair, preceded, terminated},
};

use crate::ast::{AssignOp, BinaryOp, Body, Expr, Literal, Local, Stmt, UnaryOp};
use crate::reserved::{UNSUPPORTED_KEYWORDS, is_reserved};

const GENERIC_MESSAGE: &str = "unexpected input";

/// Deepest nesting of parenthesized expressions, unary operators and
/// statements a marker may use.
pub(crate) const MAX_NESTING: usize = 32;

/// Most binary and postfix operators a single marker may contain. Both
/// build left-leaning chains that evaluation walks recursively.
pub(crate) const MAX_OPERATORS: usize = 256;

// ============================================================================
// Error type
// ============================================================================

/// Parse error carrying the remaining input, which locates the failure.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError<'a> {
	pub(crate) input: &'a str,
	pub(crate) message: Cow<'static, str>,
	generic: bool,
}

impl<'a> SyntaxError<'a> {
	fn new(input: &'a str, message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			input,
			message: message.into(),
			generic: false,
		}
	}

	fn failure(input: &'a str, message: impl Into<Cow<'static, str>>) -> nom::Err<Self> {
		nom::Err::Failure(Self::new(input, message))
	}
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
	fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
		Self {
			input,
			message: Cow::Borrowed(GENERIC_MESSAGE),
			generic: true,
		}
	}

	fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
		other
	}

	/// Keeps whichever alternative got further.
	fn or(self, other: Self) -> Self {
		let further = other.input.len() < self.input.len();
		let tied = other.input.len() == self.input.len();
		if further || (tied && self.generic) {
			other
		} else {
			self
		}
	}
}

impl<'a> ContextError<&'a str> for SyntaxError<'a> {
	fn add_context(input: &'a str, ctx: &'static str, other: Self) -> Self {
		if other.generic && other.input.len() == input.len() {
			Self::new(input, ctx)
		} else {
			other
		}
	}
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

fn finish<'a, T>(result: PResult<'a, T>) -> Result<T, SyntaxError<'a>> {
	match result {
		Ok((_, parsed)) => Ok(parsed),
		Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e),
		Err(nom::Err::Incomplete(_)) => Err(SyntaxError::new("", "unexpected end of input")),
	}
}

// ============================================================================
// Limits
// ============================================================================

thread_local! {
	static NESTING: Cell<usize> = const { Cell::new(0) };
	static OPERATORS: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting for as long as it lives.
struct Nested;

impl Nested {
	fn enter(input: &str) -> Result<Self, nom::Err<SyntaxError<'_>>> {
		NESTING.with(|depth| {
			if depth.get() >= MAX_NESTING {
				return Err(SyntaxError::failure(input, "expression nested too deeply"));
			}
			depth.set(depth.get() + 1);
			Ok(Nested)
		})
	}
}

impl Drop for Nested {
	fn drop(&mut self) {
		NESTING.with(|depth| depth.set(depth.get().saturating_sub(1)));
	}
}

/// Counts one operator against the marker's budget. Consumes no input.
fn operator_budget(input: &str) -> PResult<'_, ()> {
	OPERATORS.with(|count| {
		if count.get() >= MAX_OPERATORS {
			return Err(SyntaxError::failure(input, "expression has too many operators"));
		}
		count.set(count.get() + 1);
		Ok((input, ()))
	})
}

fn reset_limits() {
	NESTING.with(|depth| depth.set(0));
	OPERATORS.with(|count| count.set(0));
}

// ============================================================================
// Entry points
// ============================================================================

/// Parses a marker body. Brace-delimited text is a statement block, anything
/// else a single expression; blank text is an empty block.
pub(crate) fn parse_body(source: &str) -> Result<Body, SyntaxError<'_>> {
	reset_limits();
	let trimmed = source.trim();
	if trimmed.is_empty() {
		return Ok(Body::Block(Vec::new()));
	}
	if trimmed.starts_with('{') && trimmed.ends_with('}') {
		finish(
			terminated(
				statement_list,
				pair(multispace0, context("unexpected input after statement", eof)),
			)
			.map(Body::Block)
			.parse(source),
		)
	} else {
		finish(
			terminated(
				expression,
				pair(multispace0, context("unexpected input after expression", eof)),
			)
			.map(Body::Expression)
			.parse(source),
		)
	}
}

/// Parses the target of a two-way binding: `name` or `this.name`.
pub(crate) fn parse_field(source: &str) -> Result<String, SyntaxError<'_>> {
	finish(
		terminated(
			field_reference,
			pair(multispace0, context("expected a plain field name", eof)),
		)
		.parse(source),
	)
}

fn field_reference(input: &str) -> PResult<'_, String> {
	let (input, _) = multispace0(input)?;
	let (input, _) = opt(pair(keyword("this"), ws(char('.')))).parse(input)?;
	let (start, _) = multispace0(input)?;
	let (rest, name) = context("expected field name", word).parse(start)?;
	if name.starts_with('$') {
		return Err(SyntaxError::failure(
			start,
			format!("'{}' cannot be the target of a binding", name),
		));
	}
	if is_keyword(name) {
		return Err(SyntaxError::failure(start, "expected field name"));
	}
	if is_reserved(name) {
		return Err(reserved(start, name));
	}
	Ok((rest, name.to_string()))
}

// ============================================================================
// Lexical helpers
// ============================================================================

fn is_ident_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_keyword(word: &str) -> bool {
	matches!(word, "true" | "false" | "null" | "undefined" | "this" | "typeof")
		|| UNSUPPORTED_KEYWORDS.contains(&word)
}

fn reserved<'a>(input: &'a str, name: &str) -> nom::Err<SyntaxError<'a>> {
	SyntaxError::failure(input, format!("'{}' is reserved by the engine", name))
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = SyntaxError<'a>>
where
	P: Parser<&'a str, Output = O, Error = SyntaxError<'a>>,
{
	preceded(multispace0, inner)
}

fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = SyntaxError<'a>> {
	terminated(tag(word), not(satisfy(is_ident_char)))
}

fn word(input: &str) -> PResult<'_, &str> {
	recognize(pair(satisfy(is_ident_start), take_while(is_ident_char))).parse(input)
}

fn number(input: &str) -> PResult<'_, Expr> {
	let mantissa = alt((
		recognize(pair(digit1, opt(pair(char('.'), digit0)))),
		recognize(pair(char('.'), digit1)),
	));
	let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
	map_opt(
		terminated(recognize(pair(mantissa, exponent)), not(satisfy(is_ident_char))),
		|text: &str| text.parse::<f64>().ok(),
	)
	.map(|n| Expr::Literal(Literal::Number(n)))
	.parse(input)
}

/// Single or double quoted string with the usual backslash escapes.
fn string_literal(input: &str) -> PResult<'_, String> {
	let mut chars = input.char_indices();
	let quote = match chars.next() {
		Some((_, q @ ('"' | '\''))) => q,
		_ => return Err(nom::Err::Error(SyntaxError::from_error_kind(input, ErrorKind::Char))),
	};
	let mut out = String::new();
	while let Some((i, c)) = chars.next() {
		if c == quote {
			return Ok((&input[i + c.len_utf8()..], out));
		}
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some((_, 'n')) => out.push('\n'),
			Some((_, 't')) => out.push('\t'),
			Some((_, 'r')) => out.push('\r'),
			Some((_, '0')) => out.push('\0'),
			Some((at, 'u')) => {
				let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
				let decoded = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
				match decoded {
					Some(ch) if hex.len() == 4 => out.push(ch),
					_ => {
						return Err(SyntaxError::failure(&input[at - 1..], "invalid unicode escape"));
					}
				}
			}
			Some((_, other)) => out.push(other),
			None => break,
		}
	}
	Err(SyntaxError::failure(input, "unterminated string literal"))
}

// ============================================================================
// Expressions
// ============================================================================

pub(crate) fn expression(input: &str) -> PResult<'_, Expr> {
	assignment(input)
}

fn assignment(input: &str) -> PResult<'_, Expr> {
	let _nested = Nested::enter(input)?;
	let (start, _) = multispace0(input)?;
	let (rest, left) = conditional(start)?;
	let (rest, op) = opt(ws(alt((
		value(AssignOp::Add, tag("+=")),
		value(AssignOp::Sub, tag("-=")),
		value(AssignOp::Assign, terminated(char('='), not(one_of("=>")))),
	))))
	.parse(rest)?;
	let Some(op) = op else {
		return Ok((rest, left));
	};
	let target = left
		.into_target()
		.ok_or_else(|| SyntaxError::failure(start, "invalid assignment target"))?;
	let (rest, rhs) = cut(assignment).parse(rest)?;
	Ok((
		rest,
		Expr::Assign {
			op,
			target,
			value: Box::new(rhs),
		},
	))
}

fn conditional(input: &str) -> PResult<'_, Expr> {
	let (input, test) = coalesce(input)?;
	let (input, question) = opt(ws(terminated(char('?'), not(one_of("?."))))).parse(input)?;
	if question.is_none() {
		return Ok((input, test));
	}
	let (input, consequent) = cut(assignment).parse(input)?;
	let (input, _) = cut(context("expected ':'", ws(char(':')))).parse(input)?;
	let (input, alternate) = cut(assignment).parse(input)?;
	Ok((
		input,
		Expr::Conditional {
			test: Box::new(test),
			consequent: Box::new(consequent),
			alternate: Box::new(alternate),
		},
	))
}

/// Left-associative binary level: `operand (operator operand)*`.
fn binary_level<'a, O>(
	input: &'a str,
	operand: fn(&'a str) -> PResult<'a, Expr>,
	operator: O,
) -> PResult<'a, Expr>
where
	O: Parser<&'a str, Output = BinaryOp, Error = SyntaxError<'a>>,
{
	let (input, first) = operand(input)?;
	fold_many0(
		pair(terminated(ws(operator), operator_budget), cut(operand)),
		move || first.clone(),
		|left, (op, right)| Expr::binary(op, left, right),
	)
	.parse(input)
}

fn coalesce(input: &str) -> PResult<'_, Expr> {
	binary_level(input, logical_or, value(BinaryOp::Coalesce, tag("??")))
}

fn logical_or(input: &str) -> PResult<'_, Expr> {
	binary_level(input, logical_and, value(BinaryOp::Or, tag("||")))
}

fn logical_and(input: &str) -> PResult<'_, Expr> {
	binary_level(input, equality, value(BinaryOp::And, tag("&&")))
}

fn equality(input: &str) -> PResult<'_, Expr> {
	binary_level(
		input,
		relational,
		alt((
			value(BinaryOp::StrictEq, tag("===")),
			value(BinaryOp::StrictNe, tag("!==")),
			value(BinaryOp::LooseEq, tag("==")),
			value(BinaryOp::LooseNe, tag("!=")),
		)),
	)
}

fn relational(input: &str) -> PResult<'_, Expr> {
	binary_level(
		input,
		additive,
		alt((
			value(BinaryOp::Le, tag("<=")),
			value(BinaryOp::Ge, tag(">=")),
			value(BinaryOp::Lt, char('<')),
			value(BinaryOp::Gt, char('>')),
		)),
	)
}

fn additive(input: &str) -> PResult<'_, Expr> {
	binary_level(
		input,
		multiplicative,
		alt((
			value(BinaryOp::Add, terminated(char('+'), not(one_of("+=")))),
			value(BinaryOp::Sub, terminated(char('-'), not(one_of("-=")))),
		)),
	)
}

fn multiplicative(input: &str) -> PResult<'_, Expr> {
	binary_level(
		input,
		unary,
		alt((
			value(BinaryOp::Mul, terminated(char('*'), not(char('=')))),
			value(BinaryOp::Div, terminated(char('/'), not(char('=')))),
			value(BinaryOp::Rem, terminated(char('%'), not(char('=')))),
		)),
	)
}

fn unary(input: &str) -> PResult<'_, Expr> {
	let (input, _) = multispace0(input)?;
	let (rest, op) = opt(alt((
		value(UnaryOp::Not, char('!')),
		value(UnaryOp::Neg, char('-')),
		value(UnaryOp::Plus, char('+')),
		value(UnaryOp::Typeof, keyword("typeof")),
	)))
	.parse(input)?;
	match op {
		Some(op) => {
			let _nested = Nested::enter(input)?;
			let (rest, operand) = cut(unary).parse(rest)?;
			Ok((
				rest,
				Expr::Unary {
					op,
					operand: Box::new(operand),
				},
			))
		}
		None => postfix(input),
	}
}

enum Postfix {
	Member(String),
	Index(Expr),
	Call(Vec<Expr>),
}

fn postfix(input: &str) -> PResult<'_, Expr> {
	let (input, base) = primary(input)?;
	fold_many0(
		terminated(
			alt((
				map(
					preceded(
						ws(char('.')),
						cut(context("expected property name", ws(word))),
					),
					|name: &str| Postfix::Member(name.to_string()),
				),
				map(
					delimited(
						ws(char('[')),
						cut(expression),
						cut(context("expected ']'", ws(char(']')))),
					),
					Postfix::Index,
				),
				map(
					delimited(
						ws(char('(')),
						separated_list0(ws(char(',')), expression),
						cut(context("expected ')'", ws(char(')')))),
					),
					Postfix::Call,
				),
			)),
			operator_budget,
		),
		move || base.clone(),
		|object, op| match op {
			Postfix::Member(property) => Expr::Member {
				object: Box::new(object),
				property,
			},
			Postfix::Index(index) => Expr::Index {
				object: Box::new(object),
				index: Box::new(index),
			},
			Postfix::Call(args) => Expr::Call {
				callee: Box::new(object),
				args,
			},
		},
	)
	.parse(input)
}

fn primary(input: &str) -> PResult<'_, Expr> {
	context(
		"expected expression",
		alt((
			number,
			map(string_literal, |s| Expr::Literal(Literal::String(s))),
			delimited(
				char('('),
				expression,
				cut(context("expected ')'", ws(char(')')))),
			),
			this_member,
			name,
		)),
	)
	.parse(input)
}

fn this_member(input: &str) -> PResult<'_, Expr> {
	let (rest, _) = keyword("this").parse(input)?;
	let (rest, _) = cut(context("expected '.' after 'this'", ws(char('.')))).parse(rest)?;
	let (start, _) = multispace0(rest)?;
	let (rest, field) = cut(context("expected field name", word)).parse(start)?;
	if is_reserved(field) {
		return Err(reserved(start, field));
	}
	Ok((rest, Expr::Field(field.to_string())))
}

fn name(input: &str) -> PResult<'_, Expr> {
	let (rest, word) = word(input)?;
	let expr = match word {
		"true" => Expr::Literal(Literal::Bool(true)),
		"false" => Expr::Literal(Literal::Bool(false)),
		"null" => Expr::Literal(Literal::Null),
		"undefined" => Expr::Literal(Literal::Undefined),
		"$el" => Expr::Local(Local::El),
		"$event" => Expr::Local(Local::Event),
		_ if word.starts_with('$') => {
			return Err(SyntaxError::failure(input, format!("unknown local '{}'", word)));
		}
		_ if UNSUPPORTED_KEYWORDS.contains(&word) => {
			return Err(SyntaxError::failure(
				input,
				format!("unsupported keyword '{}'", word),
			));
		}
		_ if is_reserved(word) => return Err(reserved(input, word)),
		_ => Expr::Field(word.to_string()),
	};
	Ok((rest, expr))
}

// ============================================================================
// Statements
// ============================================================================

fn statement_list(input: &str) -> PResult<'_, Vec<Stmt>> {
	map(
		many0(alt((value(None, ws(char(';'))), map(statement, Some)))),
		|stmts| stmts.into_iter().flatten().collect::<Vec<Stmt>>(),
	)
	.parse(input)
}

fn statement(input: &str) -> PResult<'_, Stmt> {
	let (input, _) = multispace0(input)?;
	let _nested = Nested::enter(input)?;
	alt((block, return_statement, if_statement, expression_statement)).parse(input)
}

fn block(input: &str) -> PResult<'_, Stmt> {
	map(
		delimited(
			char('{'),
			statement_list,
			cut(context("expected '}'", ws(char('}')))),
		),
		Stmt::Block,
	)
	.parse(input)
}

fn return_statement(input: &str) -> PResult<'_, Stmt> {
	let (input, _) = keyword("return").parse(input)?;
	let (input, argument) = opt(expression).parse(input)?;
	let (input, _) = statement_end(input)?;
	Ok((input, Stmt::Return(argument)))
}

fn if_statement(input: &str) -> PResult<'_, Stmt> {
	let (input, _) = keyword("if").parse(input)?;
	let (input, test) = cut(delimited(
		context("expected '('", ws(char('('))),
		expression,
		context("expected ')'", ws(char(')'))),
	))
	.parse(input)?;
	let (input, consequent) = cut(statement).parse(input)?;
	let (input, alternate) = opt(preceded(ws(keyword("else")), cut(statement))).parse(input)?;
	Ok((
		input,
		Stmt::If {
			test,
			consequent: Box::new(consequent),
			alternate: alternate.map(Box::new),
		},
	))
}

fn expression_statement(input: &str) -> PResult<'_, Stmt> {
	let (input, expr) = expression(input)?;
	let (input, _) = statement_end(input)?;
	Ok((input, Stmt::Expression(expr)))
}

/// A statement ends at `;`, a line break, a closing brace or the end of
/// the body.
fn statement_end(input: &str) -> PResult<'_, ()> {
	let (rest, spaces) = multispace0(input)?;
	if let Some(rest) = rest.strip_prefix(';') {
		return Ok((rest, ()));
	}
	if spaces.contains('\n') || rest.is_empty() || rest.starts_with('}') {
		return Ok((rest, ()));
	}
	Err(SyntaxError::failure(rest, "expected ';' before the next statement"))
}
