//! # Bridge Runtime Library
//!
//! Exposes the runtime's configuration loader and reference engine for testing.
//! The main entry point is the `main.rs` binary.

#![warn(clippy::all)]

pub mod config;
pub mod engine;

pub use config::{load_config, load_config_from};
pub use engine::{PingEngine, METHOD_NOT_FOUND};
