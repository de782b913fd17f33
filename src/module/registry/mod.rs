//! Module registry and discovery
//!
//! Handles directory scanning and the resolvable-name index.

pub mod discovery;
pub mod index;

pub use discovery::{ModuleDiscovery, ScanReport, SkippedFile};
pub use index::ResolvableNames;
