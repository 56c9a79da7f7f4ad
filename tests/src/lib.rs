//! # MCP HTTP Bridge Test Suite
//!
//! Unified test crate driving the bridge over real HTTP.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs       # Bridge on an ephemeral port, scripted engines
//!     ├── correlation.rs   # Identity, fan-out and reply routing
//!     ├── surface.rs       # Liveness, malformed calls, limits, deadlines
//!     └── lifecycle.rs     # Start, drain, stop
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::lifecycle::
//! ```

#![allow(dead_code)]

pub mod integration;
