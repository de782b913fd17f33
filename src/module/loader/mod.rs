//! Host-side module loading
//!
//! Default search path probing with fallback to the resolution-failure channel.

pub mod loader;

pub use loader::HostLoader;
