//! Resolver traits and interfaces
//!
//! Defines the host collaboration surface the resolver consumes, the loaded
//! module handle it hands back, and the error and outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::module::image::ModuleHeader;

/// A module loaded by the host
///
/// Carries the header the module declared and the exact path it was loaded
/// from, so callers can verify where a resolution was serviced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedModule {
    /// Declared identity of the module
    pub header: ModuleHeader,
    /// Path the module was loaded from
    pub path: PathBuf,
    /// Module body following the header
    pub payload: Vec<u8>,
}

impl LoadedModule {
    /// Declared short name
    pub fn short_name(&self) -> &str {
        &self.header.name
    }
}

/// Host primitives the resolver needs
///
/// Implemented by the host's module subsystem. Both calls are synchronous and
/// may be invoked concurrently from any loader thread.
pub trait ModuleHost: Send + Sync {
    /// Read the short name a module file declares in its header
    ///
    /// Must fail for files that are not loadable modules.
    fn read_short_name(&self, path: &Path) -> Result<String, ResolverError>;

    /// Load the module stored at exactly `path`
    fn load_from(&self, path: &Path) -> Result<Arc<LoadedModule>, ResolverError>;
}

/// Something that knows where an add-in's own module lives on disk
///
/// Used solely at construction to derive the owning directory.
pub trait ModuleLocation {
    /// On-disk location, if the module has one
    fn location(&self) -> Option<&Path>;
}

impl ModuleLocation for LoadedModule {
    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

impl ModuleLocation for Path {
    fn location(&self) -> Option<&Path> {
        Some(self)
    }
}

impl ModuleLocation for PathBuf {
    fn location(&self) -> Option<&Path> {
        Some(self.as_path())
    }
}

impl<T: ModuleLocation + ?Sized> ModuleLocation for Arc<T> {
    fn location(&self) -> Option<&Path> {
        (**self).location()
    }
}

/// Why the interceptor declined a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decline {
    /// Request string had no usable short name
    MalformedRequest,
    /// Short name is not shipped by this add-in
    NotIndexed,
    /// Indexed, but the file is gone from the owning directory
    FileMissing,
    /// File exists but the host could not load it
    LoadFailed,
    /// Resolver has been disposed
    Disposed,
}

impl fmt::Display for Decline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Decline::MalformedRequest => "malformed request",
            Decline::NotIndexed => "not indexed",
            Decline::FileMissing => "file missing",
            Decline::LoadFailed => "load failed",
            Decline::Disposed => "disposed",
        };
        f.write_str(reason)
    }
}

/// Result of running the interceptor against one request
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// Request serviced from the owning directory
    Resolved(Arc<LoadedModule>),
    /// Request left to the host's default failure behaviour
    Declined(Decline),
}

impl ResolveOutcome {
    /// Loaded module, if the request was serviced
    pub fn into_module(self) -> Option<Arc<LoadedModule>> {
        match self {
            ResolveOutcome::Resolved(module) => Some(module),
            ResolveOutcome::Declined(_) => None,
        }
    }

    /// Whether the request was serviced
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolveOutcome::Resolved(_))
    }

    /// Decline reason, if any
    pub fn decline(&self) -> Option<Decline> {
        match self {
            ResolveOutcome::Resolved(_) => None,
            ResolveOutcome::Declined(reason) => Some(*reason),
        }
    }
}

/// Resolver errors
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid module header in {path:?}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Failed to load module {path:?}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Invalid resolution request: {0}")]
    InvalidRequest(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Subscription not registered: {0}")]
    NotSubscribed(u64),

    #[error("Resolver already disposed")]
    AlreadyDisposed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for ResolverError {
    fn from(e: bincode::Error) -> Self {
        ResolverError::InvalidHeader {
            path: PathBuf::new(),
            reason: e.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResolverError {
    fn from(e: toml::de::Error) -> Self {
        ResolverError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(e: serde_json::Error) -> Self {
        ResolverError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_module() -> LoadedModule {
        LoadedModule {
            header: ModuleHeader::new("Foo", "1.0.0.0"),
            path: PathBuf::from("/opt/addins/foo/Foo.dll"),
            payload: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_loaded_module_location() {
        let module = sample_module();
        assert_eq!(module.short_name(), "Foo");
        assert_eq!(
            module.location(),
            Some(Path::new("/opt/addins/foo/Foo.dll"))
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let resolved = ResolveOutcome::Resolved(Arc::new(sample_module()));
        assert!(resolved.is_resolved());
        assert_eq!(resolved.decline(), None);
        assert!(resolved.into_module().is_some());

        let declined = ResolveOutcome::Declined(Decline::NotIndexed);
        assert!(!declined.is_resolved());
        assert_eq!(declined.decline(), Some(Decline::NotIndexed));
        assert!(declined.into_module().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = ResolverError::InvalidArgument("owning module is required".into());
        assert_eq!(
            err.to_string(),
            "Invalid argument: owning module is required"
        );
        assert_eq!(Decline::FileMissing.to_string(), "file missing");
    }
}
