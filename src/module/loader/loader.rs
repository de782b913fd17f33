//! Host module loader
//!
//! The host side of resolution: probe the host's own search directories, and
//! only when that fails broadcast a resolution-failure notification so
//! subscribed add-in resolvers get a chance to answer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::module::api::events::ResolveEvents;
use crate::module::image::validate_short_name;
use crate::module::request::ModuleRequest;
use crate::module::traits::{LoadedModule, ModuleHost, ResolverError};

/// Default-search loader that falls back to the failure channel
pub struct HostLoader {
    probe_dirs: Vec<PathBuf>,
    extension: String,
    host: Arc<dyn ModuleHost>,
    events: Arc<ResolveEvents>,
}

impl HostLoader {
    pub fn new(host: Arc<dyn ModuleHost>, events: Arc<ResolveEvents>) -> Self {
        Self {
            probe_dirs: Vec::new(),
            extension: ResolverConfig::default().module_extension,
            host,
            events,
        }
    }

    pub fn from_config(
        config: &ResolverConfig,
        host: Arc<dyn ModuleHost>,
        events: Arc<ResolveEvents>,
    ) -> Self {
        Self::new(host, events).with_extension(&config.module_extension)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Add a directory to the default search path
    pub fn with_probe_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.probe_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    pub fn probe_dirs(&self) -> &[PathBuf] {
        &self.probe_dirs
    }

    /// Load a module for a request string
    pub fn load(&self, request: &str) -> Result<Arc<LoadedModule>, ResolverError> {
        let parsed = ModuleRequest::parse(request)?;

        if let Some(module) = self.probe(&parsed.name) {
            return Ok(module);
        }

        debug!("Default search failed for {}, notifying resolvers", parsed.name);
        match self.events.dispatch(request) {
            Some(module) => {
                info!("{} resolved by add-in from {:?}", parsed.name, module.path);
                Ok(module)
            }
            None => Err(ResolverError::ModuleNotFound(request.to_string())),
        }
    }

    fn probe(&self, name: &str) -> Option<Arc<LoadedModule>> {
        if validate_short_name(name).is_err() {
            return None;
        }
        let file_name = format!("{}.{}", name, self.extension);

        for dir in &self.probe_dirs {
            let candidate = dir.join(&file_name);
            if !candidate.is_file() {
                continue;
            }
            match self.host.load_from(&candidate) {
                Ok(module) if module.short_name().to_lowercase() == name.to_lowercase() => {
                    return Some(module)
                }
                Ok(module) => debug!(
                    "{:?} declares {}, not {}",
                    candidate,
                    module.short_name(),
                    name
                ),
                Err(e) => debug!("Probe of {:?} failed: {}", candidate, e),
            }
        }
        None
    }
}
