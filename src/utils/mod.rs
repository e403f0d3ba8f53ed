//! Utility functions and helpers.

pub mod format;
pub mod text;

pub use format::*;
pub use text::*;
