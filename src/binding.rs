//! The binding engine
//!
//! This module provides access to datawire-binding: marker scanning, the
//! binding table and update cycle, components and their lifecycle, the
//! event loop that defers setup, and the application bootstrap.

pub use datawire_binding::*;
