//! Ports for the bridge.

pub mod transport;

pub use transport::{EnvelopeListener, ListenerError, ServerTransport};
