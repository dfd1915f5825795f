//! Property and event name tables.
//!
//! Marker targets are validated against these tables; a name that is not
//! listed here is not an element property (or event) as far as the binding
//! engine is concerned.

/// How a property maps onto element state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertyKind {
	/// Reads and writes the named attribute as a string.
	ReflectString(&'static str),
	/// Reads and writes presence of the named attribute.
	ReflectBool(&'static str),
	/// Live value defaulting to the named attribute.
	Live {
		attribute: &'static str,
		boolean: bool,
	},
	/// `innerText` / `textContent`.
	Text,
	/// `innerHTML`.
	Html,
	/// `tagName`, read-only.
	TagName,
	/// Stored on the element without touching attributes.
	Plain,
}

const REFLECTED_STRINGS: &[(&str, &str)] = &[
	("id", "id"),
	("className", "class"),
	("title", "title"),
	("name", "name"),
	("type", "type"),
	("placeholder", "placeholder"),
	("href", "href"),
	("src", "src"),
	("alt", "alt"),
	("htmlFor", "for"),
	("lang", "lang"),
	("dir", "dir"),
	("role", "role"),
	("action", "action"),
	("method", "method"),
	("target", "target"),
	("rel", "rel"),
	("pattern", "pattern"),
	("min", "min"),
	("max", "max"),
	("step", "step"),
	("autocomplete", "autocomplete"),
	("inputMode", "inputmode"),
	("accessKey", "accesskey"),
];

const REFLECTED_BOOLS: &[(&str, &str)] = &[
	("disabled", "disabled"),
	("hidden", "hidden"),
	("required", "required"),
	("readOnly", "readonly"),
	("multiple", "multiple"),
	("autofocus", "autofocus"),
	("open", "open"),
	("noValidate", "novalidate"),
];

const PLAIN: &[&str] = &[
	"tabIndex",
	"indeterminate",
	"scrollTop",
	"scrollLeft",
	"selectionStart",
	"selectionEnd",
	"defaultValue",
];

const EVENTS: &[&str] = &[
	// Mouse events
	"click",
	"dblclick",
	"mousedown",
	"mouseup",
	"mouseenter",
	"mouseleave",
	"mousemove",
	"mouseover",
	"mouseout",
	"contextmenu",
	"wheel",
	// Pointer events
	"pointerdown",
	"pointerup",
	"pointermove",
	// Keyboard events
	"keydown",
	"keyup",
	"keypress",
	// Form events
	"input",
	"beforeinput",
	"change",
	"submit",
	"reset",
	"invalid",
	"select",
	"focus",
	"blur",
	"focusin",
	"focusout",
	// Touch events
	"touchstart",
	"touchend",
	"touchmove",
	"touchcancel",
	// Drag events
	"dragstart",
	"drag",
	"drop",
	"dragenter",
	"dragleave",
	"dragover",
	"dragend",
	// Clipboard events
	"copy",
	"cut",
	"paste",
	// Other events
	"load",
	"error",
	"scroll",
	"resize",
	"animationend",
	"transitionend",
];

pub(crate) fn property_kind(name: &str) -> Option<PropertyKind> {
	if let Some((_, attr)) = REFLECTED_STRINGS.iter().find(|(prop, _)| *prop == name) {
		return Some(PropertyKind::ReflectString(attr));
	}
	if let Some((_, attr)) = REFLECTED_BOOLS.iter().find(|(prop, _)| *prop == name) {
		return Some(PropertyKind::ReflectBool(attr));
	}
	match name {
		"value" => Some(PropertyKind::Live {
			attribute: "value",
			boolean: false,
		}),
		"checked" => Some(PropertyKind::Live {
			attribute: "checked",
			boolean: true,
		}),
		"selected" => Some(PropertyKind::Live {
			attribute: "selected",
			boolean: true,
		}),
		"innerText" | "textContent" => Some(PropertyKind::Text),
		"innerHTML" => Some(PropertyKind::Html),
		"tagName" => Some(PropertyKind::TagName),
		_ if PLAIN.contains(&name) => Some(PropertyKind::Plain),
		_ => None,
	}
}

/// Returns true if `name` is a recognized element property.
pub fn is_known_property(name: &str) -> bool {
	property_kind(name).is_some()
}

/// Returns true if `name` is a recognized DOM event type.
pub fn is_known_event(name: &str) -> bool {
	EVENTS.contains(&name)
}

/// Tags that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}
