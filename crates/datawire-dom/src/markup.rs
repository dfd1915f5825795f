//! Markup fragments: a small nom parser and the matching serializer.
//!
//! This is not an HTML5 tree builder. It accepts well-formed fragments of
//! the kind a widget template contains: nested elements, quoted, unquoted
//! and valueless attributes, void elements, `/>` self-closing syntax,
//! comments (dropped) and the common character references.

use std::cell::Cell;

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_until, take_while, take_while1},
	character::complete::{char, multispace0, multispace1},
	combinator::{map, opt, value},
	error::{Error, ErrorKind},
	multi::many0,
	sequence::{delimited, preceded},
};

use crate::element::{Element, Node};
use crate::error::MarkupError;
use crate::names::is_void_element;

/// Deepest element nesting a fragment may use.
pub const MAX_DEPTH: usize = 48;

thread_local! {
	static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of element nesting for as long as it lives.
struct Depth;

impl Depth {
	fn enter(input: &str) -> Result<Self, nom::Err<Error<&str>>> {
		DEPTH.with(|depth| {
			if depth.get() >= MAX_DEPTH {
				return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
			}
			depth.set(depth.get() + 1);
			Ok(Depth)
		})
	}
}

impl Drop for Depth {
	fn drop(&mut self) {
		DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
	}
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a markup fragment into detached nodes.
///
/// # Errors
///
/// Returns a [`MarkupError`] carrying the offset where parsing stopped,
/// e.g. for an unclosed or mismatched tag.
///
/// # Example
///
/// ```
/// use datawire_dom::{Node, parse_fragment};
///
/// let nodes = parse_fragment("<b>bold</b> text").unwrap();
/// assert_eq!(nodes.len(), 2);
/// assert!(matches!(&nodes[1], Node::Text(t) if t == " text"));
/// ```
pub fn parse_fragment(source: &str) -> Result<Vec<Node>, MarkupError> {
	match nodes(source) {
		Ok(("", parsed)) => Ok(parsed),
		Ok((rest, _)) => Err(MarkupError::new(
			source.len() - rest.len(),
			describe_stop(rest),
		)),
		Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(MarkupError::new(
			source.len() - e.input.len(),
			format!("elements nested deeper than {}", MAX_DEPTH),
		)),
		Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(MarkupError::new(
			source.len() - e.input.len(),
			describe_stop(e.input),
		)),
		Err(nom::Err::Incomplete(_)) => Err(MarkupError::new(source.len(), "unexpected end of input")),
	}
}

fn describe_stop(rest: &str) -> String {
	if rest.starts_with("</") {
		let name: String = rest[2..]
			.chars()
			.take_while(|c| is_name_char(*c))
			.collect();
		format!("unexpected closing tag </{}>", name)
	} else if rest.starts_with('<') {
		"unclosed or malformed tag".to_string()
	} else {
		"unexpected input".to_string()
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

fn is_attr_name_char(c: char) -> bool {
	!c.is_whitespace() && !matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
}

fn nodes(input: &str) -> IResult<&str, Vec<Node>> {
	map(many0(node), |parsed| parsed.into_iter().flatten().collect::<Vec<Node>>()).parse(input)
}

/// A single node; comments yield `None`.
fn node(input: &str) -> IResult<&str, Option<Node>> {
	alt((
		value(None, comment),
		map(element, |el| Some(Node::Element(el))),
		map(text, |t| Some(Node::Text(t))),
	))
	.parse(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
	delimited(tag("<!--"), take_until("-->"), tag("-->")).parse(input)
}

fn text(input: &str) -> IResult<&str, String> {
	map(take_while1(|c: char| c != '<'), decode_entities).parse(input)
}

fn tag_name(input: &str) -> IResult<&str, &str> {
	take_while1(is_name_char).parse(input)
}

fn attribute(input: &str) -> IResult<&str, (String, String)> {
	let (input, name) = take_while1(is_attr_name_char).parse(input)?;
	let (input, val) = opt(preceded(
		delimited(multispace0, char('='), multispace0),
		attribute_value,
	))
	.parse(input)?;
	Ok((
		input,
		(
			name.to_ascii_lowercase(),
			val.map(decode_entities).unwrap_or_default(),
		),
	))
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
	alt((
		delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
		delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
		take_while1(|c: char| !c.is_whitespace() && !matches!(c, '"' | '\'' | '>' | '<' | '=' | '`')),
	))
	.parse(input)
}

fn element(input: &str) -> IResult<&str, Element> {
	let (input, name) = preceded(char('<'), tag_name).parse(input)?;
	let (input, attrs) = many0(preceded(multispace1, attribute)).parse(input)?;
	let (input, _) = multispace0(input)?;
	let (input, self_closing) = alt((value(true, tag("/>")), value(false, tag(">")))).parse(input)?;

	let el = Element::new(name);
	for (attr, val) in attrs {
		el.set_attribute(&attr, val);
	}

	let lowered = name.to_ascii_lowercase();
	if self_closing || is_void_element(&lowered) {
		return Ok((input, el));
	}

	let depth = Depth::enter(input)?;
	let (input, children) = nodes(input)?;
	drop(depth);
	for child in children {
		// Freshly parsed nodes have no parent, so this cannot form a cycle.
		let _ = el.append_child(child);
	}

	let (rest, close) = delimited(
		tag("</"),
		delimited(multispace0, tag_name, multispace0),
		char('>'),
	)
	.parse(input)?;
	if !close.eq_ignore_ascii_case(name) {
		return Err(nom::Err::Failure(Error::new(input, ErrorKind::Tag)));
	}
	Ok((rest, el))
}

/// Decodes named and numeric character references. Unknown references are
/// kept verbatim.
pub(crate) fn decode_entities(raw: &str) -> String {
	if !raw.contains('&') {
		return raw.to_string();
	}
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(pos) = rest.find('&') {
		out.push_str(&rest[..pos]);
		rest = &rest[pos..];
		let decoded = rest.find(';').and_then(|end| {
			let entity = &rest[1..end];
			let ch = match entity {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				"apos" => Some('\''),
				"nbsp" => Some('\u{a0}'),
				_ => entity
					.strip_prefix("#x")
					.or_else(|| entity.strip_prefix("#X"))
					.and_then(|hex| u32::from_str_radix(hex, 16).ok())
					.or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
					.and_then(char::from_u32),
			};
			ch.map(|c| (c, end))
		});
		match decoded {
			Some((c, end)) => {
				out.push(c);
				rest = &rest[end + 1..];
			}
			None => {
				out.push('&');
				rest = &rest[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

// ============================================================================
// Serialization
// ============================================================================

/// Escapes a string for use in text content.
pub fn escape_text(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// Escapes a string for use in an HTML attribute value.
pub fn escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

pub(crate) fn serialize_nodes(nodes: &[Node]) -> String {
	let mut out = String::new();
	for node in nodes {
		write_node(node, &mut out);
	}
	out
}

fn write_node(node: &Node, out: &mut String) {
	match node {
		Node::Text(text) => out.push_str(&escape_text(text)),
		Node::Element(el) => el.with_data(|tag, attributes, children| {
			out.push('<');
			out.push_str(tag);
			for (name, val) in attributes {
				out.push(' ');
				out.push_str(name);
				out.push_str("=\"");
				out.push_str(&escape_attr(val));
				out.push('"');
			}
			out.push('>');
			if is_void_element(tag) {
				return;
			}
			for child in children {
				write_node(child, out);
			}
			out.push_str("</");
			out.push_str(tag);
			out.push('>');
		}),
	}
}
