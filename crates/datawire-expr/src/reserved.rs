//! Names expressions are not allowed to reach.
//!
//! A marker expression runs against the component scope. The engine's own
//! entry points live on the component too, so these names are rejected when
//! compiling a bare identifier or a `this.` member.

/// Engine-internal names, in both the camelCase spelling markup authors use
/// and the snake_case spelling of the Rust hooks.
pub const RESERVED_NAMES: &[&str] = &[
	"constructor",
	"postSetup",
	"preUpdate",
	"postUpdate",
	"preDisconnect",
	"setupEvents",
	"update",
	"disconnect",
	"root",
	"binds",
	"post_setup",
	"pre_update",
	"post_update",
	"pre_disconnect",
	"setup_events",
];

/// JavaScript keywords the grammar does not support. Using one as an
/// identifier is a compile error rather than a silent field lookup.
pub(crate) const UNSUPPORTED_KEYWORDS: &[&str] = &[
	"break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
	"do", "else", "export", "extends", "finally", "for", "function", "if", "import", "in",
	"instanceof", "let", "new", "return", "super", "switch", "throw", "try", "var", "void",
	"while", "with", "yield",
];

/// Returns true if `name` is reserved by the engine.
///
/// # Example
///
/// ```
/// use datawire_expr::is_reserved;
///
/// assert!(is_reserved("update"));
/// assert!(is_reserved("pre_update"));
/// assert!(!is_reserved("username"));
/// ```
pub fn is_reserved(name: &str) -> bool {
	RESERVED_NAMES.contains(&name)
}
