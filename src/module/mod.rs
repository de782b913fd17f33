//! Add-in module resolution
//!
//! Hosts load every add-in into one process. When two add-ins ship different
//! versions of the same module, the host's default search can bind the wrong
//! one. This module lets each add-in answer failed lookups for the modules it
//! ships itself, from its own directory only.
//!
//! ## Architecture
//!
//! - **Index**: one non-recursive scan of the add-in directory at construction
//!   builds a case-insensitive set of declared short names
//! - **Interceptor**: subscribed to the host's resolution-failure channel;
//!   answers only for indexed names, only from the add-in directory
//! - **Containment**: a declined or failed lookup leaves the host's outcome
//!   exactly as it would have been without the resolver

pub mod api;
pub mod image;
pub mod loader;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod traits;

pub use api::{ResolveEvents, ResolveHandler, SubscriptionId};
pub use image::{ImageHost, ModuleHeader};
pub use loader::HostLoader;
pub use registry::{ModuleDiscovery, ResolvableNames, ScanReport};
pub use request::ModuleRequest;
pub use resolver::{AddinResolver, ResolutionInterceptor};
pub use traits::{
    Decline, LoadedModule, ModuleHost, ModuleLocation, ResolveOutcome, ResolverError,
};
