//! Marker expressions
//!
//! This module provides access to datawire-expr, the expression language
//! marker attributes are written in.

pub use datawire_expr::*;
