//! Add-in dependency resolver
//!
//! An [`AddinResolver`] indexes the modules shipped in an add-in's own
//! directory and subscribes a [`ResolutionInterceptor`] to the host's
//! resolution-failure channel. The interceptor only ever answers for names in
//! that index and only ever loads from that directory, so resolvers of
//! different add-ins can share one channel without shadowing each other or the
//! host.
//!
//! ```rust,ignore
//! use addin_resolver::{AddinResolver, ImageHost};
//! use std::sync::Arc;
//!
//! let mut resolver = AddinResolver::new(Some(&my_module_path), Arc::new(ImageHost::new()))?;
//! // ... add-in runs; failed lookups for its own modules are now serviced ...
//! resolver.dispose()?;
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::config::ResolverConfig;
use crate::module::api::events::{ResolveEvents, ResolveHandler, SubscriptionId};
use crate::module::registry::discovery::ModuleDiscovery;
use crate::module::registry::index::ResolvableNames;
use crate::module::request::ModuleRequest;
use crate::module::traits::{
    Decline, LoadedModule, ModuleHost, ModuleLocation, ResolveOutcome, ResolverError,
};
use crate::utils::error::result_to_option;

/// Callback servicing failed lookups from one owning directory
pub struct ResolutionInterceptor {
    owning_directory: PathBuf,
    names: ResolvableNames,
    extension: String,
    host: Arc<dyn ModuleHost>,
    active: AtomicBool,
}

impl ResolutionInterceptor {
    /// Path a declared short name resolves to
    pub fn candidate_path(&self, declared: &str) -> PathBuf {
        self.owning_directory
            .join(format!("{}.{}", declared, self.extension))
    }

    /// Run the resolution decision for one request
    pub fn resolve(&self, request: &str) -> ResolveOutcome {
        if !self.active.load(Ordering::Acquire) {
            return ResolveOutcome::Declined(Decline::Disposed);
        }

        let name = match ModuleRequest::short_name(request) {
            Ok(name) => name,
            Err(e) => {
                trace!("Declining {:?}: {}", request, e);
                return ResolveOutcome::Declined(Decline::MalformedRequest);
            }
        };

        let Some(declared) = self.names.declared(&name) else {
            trace!("Declining {}: not shipped in {:?}", name, self.owning_directory);
            return ResolveOutcome::Declined(Decline::NotIndexed);
        };

        let candidate = self.candidate_path(declared);
        if !candidate.is_file() {
            debug!("Declining {}: {:?} no longer exists", name, candidate);
            return ResolveOutcome::Declined(Decline::FileMissing);
        }

        let loaded = panic::catch_unwind(AssertUnwindSafe(|| self.host.load_from(&candidate)))
            .unwrap_or_else(|_| {
                Err(ResolverError::LoadFailed {
                    path: candidate.clone(),
                    reason: "host loader panicked".to_string(),
                })
            });
        let Some(module) = result_to_option(loaded, &format!("Declining {}", name)) else {
            return ResolveOutcome::Declined(Decline::LoadFailed);
        };

        if module.short_name().to_lowercase() != name.to_lowercase() {
            warn!(
                "Declining {}: {:?} now declares {}",
                name,
                candidate,
                module.short_name()
            );
            return ResolveOutcome::Declined(Decline::LoadFailed);
        }

        debug!("Resolved {} from {:?}", name, candidate);
        ResolveOutcome::Resolved(module)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl ResolveHandler for ResolutionInterceptor {
    fn on_resolve(&self, request: &str) -> Option<Arc<LoadedModule>> {
        self.resolve(request).into_module()
    }
}

struct Registration {
    events: Arc<ResolveEvents>,
    id: SubscriptionId,
}

/// Plugin-local dependency resolver
///
/// Registered from construction until [`AddinResolver::dispose`]. Dropping a
/// resolver without disposing it leaves its interceptor subscribed.
pub struct AddinResolver {
    interceptor: Arc<ResolutionInterceptor>,
    registration: Option<Registration>,
}

impl AddinResolver {
    /// Create a resolver on the process-wide channel with default config
    pub fn new(
        owner: Option<&dyn ModuleLocation>,
        host: Arc<dyn ModuleHost>,
    ) -> Result<Self, ResolverError> {
        Self::with_events(owner, host, Arc::clone(ResolveEvents::global()))
    }

    /// Create a resolver on a specific channel with default config
    pub fn with_events(
        owner: Option<&dyn ModuleLocation>,
        host: Arc<dyn ModuleHost>,
        events: Arc<ResolveEvents>,
    ) -> Result<Self, ResolverError> {
        Self::with_config(owner, host, events, &ResolverConfig::default())
    }

    /// Create a resolver
    ///
    /// Derives the owning directory from `owner`'s location, scans it, then
    /// subscribes to `events`. Fails with `InvalidArgument` when `owner` is
    /// absent or has no usable location; scan problems never fail construction.
    pub fn with_config(
        owner: Option<&dyn ModuleLocation>,
        host: Arc<dyn ModuleHost>,
        events: Arc<ResolveEvents>,
        config: &ResolverConfig,
    ) -> Result<Self, ResolverError> {
        config.validate()?;
        let owning_directory = owning_directory(owner)?;

        let names = ModuleDiscovery::new(&owning_directory, &config.module_extension)
            .discover_names(host.as_ref());

        let interceptor = Arc::new(ResolutionInterceptor {
            owning_directory,
            names,
            extension: config.module_extension.clone(),
            host,
            active: AtomicBool::new(true),
        });

        let handler: Arc<dyn ResolveHandler> = interceptor.clone();
        let id = events.subscribe(handler);

        info!(
            "Addin resolver registered for {:?} with {} resolvable modules",
            interceptor.owning_directory,
            interceptor.names.len()
        );

        Ok(Self {
            interceptor,
            registration: Some(Registration { events, id }),
        })
    }

    /// Absolute directory the resolver indexed and loads from
    pub fn owning_directory(&self) -> &Path {
        &self.interceptor.owning_directory
    }

    /// Short names indexed at construction
    pub fn resolvable_names(&self) -> &ResolvableNames {
        &self.interceptor.names
    }

    /// Whether the interceptor is still subscribed (not yet disposed)
    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Channel subscription id, `None` after dispose
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.registration.as_ref().map(|r| r.id)
    }

    /// Run the interceptor directly, with the detailed outcome
    pub fn resolve(&self, request: &str) -> ResolveOutcome {
        self.interceptor.resolve(request)
    }

    /// Unsubscribe from the channel
    ///
    /// A second call returns `AlreadyDisposed` and leaves the channel as is.
    pub fn dispose(&mut self) -> Result<(), ResolverError> {
        let registration = self
            .registration
            .take()
            .ok_or(ResolverError::AlreadyDisposed)?;

        self.interceptor.deactivate();
        registration.events.unsubscribe(registration.id)?;

        info!(
            "Addin resolver for {:?} disposed",
            self.interceptor.owning_directory
        );
        Ok(())
    }
}

impl Drop for AddinResolver {
    fn drop(&mut self) {
        if let Some(registration) = &self.registration {
            warn!(
                "Addin resolver for {:?} dropped without dispose; subscription {} leaked",
                self.interceptor.owning_directory,
                registration.id.as_u64()
            );
        }
    }
}

fn owning_directory(owner: Option<&dyn ModuleLocation>) -> Result<PathBuf, ResolverError> {
    let owner = owner.ok_or_else(|| {
        ResolverError::InvalidArgument("owning module reference is required".to_string())
    })?;
    let location = owner.location().ok_or_else(|| {
        ResolverError::InvalidArgument("owning module has no on-disk location".to_string())
    })?;
    let parent = location.parent().ok_or_else(|| {
        ResolverError::InvalidArgument(format!(
            "cannot derive a directory from {:?}",
            location
        ))
    })?;
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    std::path::absolute(parent).map_err(|e| {
        ResolverError::InvalidArgument(format!(
            "cannot make {:?} absolute: {}",
            parent, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::image::{write_image, ImageHost, ModuleHeader};
    use tempfile::TempDir;

    fn addin_dir(modules: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in modules {
            write_image(
                dir.path().join(format!("{}.dll", name)),
                &ModuleHeader::new(*name, "1.0.0.0"),
                b"",
            )
            .unwrap();
        }
        dir
    }

    fn resolver_for(dir: &TempDir, events: &Arc<ResolveEvents>) -> AddinResolver {
        let owner = dir.path().join("Addin.dll");
        AddinResolver::with_events(Some(&owner), Arc::new(ImageHost::new()), Arc::clone(events))
            .unwrap()
    }

    #[test]
    fn test_missing_owner_is_invalid_argument() {
        let events = Arc::new(ResolveEvents::new());
        let result = AddinResolver::with_events(None, Arc::new(ImageHost::new()), events.clone());
        assert!(matches!(result, Err(ResolverError::InvalidArgument(_))));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_root_location_is_invalid_argument() {
        let events = Arc::new(ResolveEvents::new());
        let root = PathBuf::from("/");
        let result = AddinResolver::with_events(Some(&root), Arc::new(ImageHost::new()), events);
        assert!(matches!(result, Err(ResolverError::InvalidArgument(_))));
    }

    #[test]
    fn test_relative_location_becomes_absolute() {
        let dir = owning_directory(Some(&PathBuf::from("Addin.dll"))).unwrap();
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_construction_registers_once() {
        let dir = addin_dir(&["Foo"]);
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);

        assert!(resolver.is_registered());
        assert_eq!(events.subscriber_count(), 1);
        assert_eq!(resolver.owning_directory(), std::path::absolute(dir.path()).unwrap());
        resolver.dispose().unwrap();
    }

    #[test]
    fn test_resolve_decisions() {
        let dir = addin_dir(&["Foo"]);
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);

        assert!(resolver.resolve("Foo").is_resolved());
        assert!(resolver.resolve("foo, Version=9.9.9.9").is_resolved());
        assert_eq!(resolver.resolve("Bar").decline(), Some(Decline::NotIndexed));
        assert_eq!(
            resolver.resolve(", Version=1.0").decline(),
            Some(Decline::MalformedRequest)
        );
        resolver.dispose().unwrap();
    }

    #[test]
    fn test_replaced_file_with_other_name_is_declined() {
        let dir = addin_dir(&["Foo"]);
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);

        write_image(dir.path().join("Foo.dll"), &ModuleHeader::new("Impostor", "1.0"), b"")
            .unwrap();
        assert_eq!(resolver.resolve("Foo").decline(), Some(Decline::LoadFailed));
        resolver.dispose().unwrap();
    }

    #[test]
    fn test_case_duplicate_resolves_through_its_own_file() {
        let dir = addin_dir(&["Foo"]);
        write_image(dir.path().join("alias.dll"), &ModuleHeader::new("FOO", "1.0"), b"").unwrap();
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);

        assert_eq!(resolver.resolvable_names().declared("foo"), Some("Foo"));
        let module = resolver.resolve("FOO").into_module().unwrap();
        assert_eq!(module.path, resolver.owning_directory().join("Foo.dll"));
        resolver.dispose().unwrap();
    }

    #[test]
    fn test_dispose_twice_is_misuse() {
        let dir = addin_dir(&[]);
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);

        resolver.dispose().unwrap();
        assert!(!resolver.is_registered());
        assert!(matches!(resolver.dispose(), Err(ResolverError::AlreadyDisposed)));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_disposed_interceptor_declines() {
        let dir = addin_dir(&["Foo"]);
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = resolver_for(&dir, &events);
        resolver.dispose().unwrap();

        assert_eq!(resolver.resolve("Foo").decline(), Some(Decline::Disposed));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = addin_dir(&[]);
        let owner = dir.path().join("Addin.dll");
        let config = ResolverConfig {
            module_extension: String::new(),
            ..ResolverConfig::default()
        };
        let result = AddinResolver::with_config(
            Some(&owner),
            Arc::new(ImageHost::new()),
            Arc::new(ResolveEvents::new()),
            &config,
        );
        assert!(matches!(result, Err(ResolverError::Config(_))));
    }
}
