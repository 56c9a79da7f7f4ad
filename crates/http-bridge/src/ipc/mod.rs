//! The two halves of the correlation bridge.
//!
//! Calls enter through `InboundEndpoint`, fan out to listeners, and come back
//! through `OutboundRouter`, which matches each reply to its caller by
//! correlation identity.

pub mod inbound;
pub mod outbound;

pub use inbound::InboundEndpoint;
pub use outbound::{OutboundRouter, RouteOutcome};
