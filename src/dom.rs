//! In-memory element tree
//!
//! This module provides access to datawire-dom: elements, attributes and
//! properties, events with synchronous dispatch, and markup parsing.

pub use datawire_dom::*;
