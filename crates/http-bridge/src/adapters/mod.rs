//! Adapters for the bridge.
//!
//! Owned, lock-protected state shared by the inbound and outbound halves.

pub mod listeners;
pub mod pending;

pub use listeners::{BroadcastReport, ListenerKind, ListenerRegistry, SubscriptionId};
pub use pending::{CorrelationRegistry, RegistryError, RegistryStats, RegistryStatsSnapshot};
