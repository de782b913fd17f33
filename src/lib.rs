//! Addin Resolver - plugin-local dependency resolution
//!
//! Hosts that load third-party add-ins into one shared process resolve every
//! add-in's dependencies through one module loader. When two add-ins ship
//! different versions of the same module, the loader can bind the wrong copy.
//!
//! This crate lets an add-in claim the modules it ships: at construction an
//! [`AddinResolver`] indexes the add-in's own directory and subscribes to the
//! host's resolution-failure channel ([`ResolveEvents`]). When the host's
//! default search cannot find a module, the resolver answers if, and only if,
//! the requested short name is one the add-in ships, loading it from the
//! add-in's directory.
//!
//! ## Design Principles
//!
//! 1. **Scope Containment**: a resolver never answers for names it does not ship
//! 2. **Lock-free Hot Path**: the name index is immutable after construction
//! 3. **Never Worse Than Nothing**: every failure declines the request instead
//!    of faulting the host's callback chain
//! 4. **Explicit Teardown**: disposal is the only path that unsubscribes

pub mod config;
pub mod module;
pub mod utils;

pub use config::ResolverConfig;
pub use module::{
    AddinResolver, Decline, HostLoader, ImageHost, LoadedModule, ModuleDiscovery, ModuleHeader,
    ModuleHost, ModuleLocation, ModuleRequest, ResolutionInterceptor, ResolvableNames,
    ResolveEvents, ResolveHandler, ResolveOutcome, ResolverError, ScanReport, SubscriptionId,
};
