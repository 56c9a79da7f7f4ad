//! Cross-crate scenarios over HTTP.

pub mod correlation;
pub mod lifecycle;
pub mod support;
