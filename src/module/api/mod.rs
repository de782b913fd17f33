//! Host-facing API surface
//!
//! The resolution-failure channel that resolvers subscribe to.

pub mod events;

pub use events::{ResolveEvents, ResolveHandler, SubscriptionId};
