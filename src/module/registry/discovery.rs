//! Module discovery
//!
//! Scans an add-in's directory and indexes the modules it ships.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::module::image::validate_short_name;
use crate::module::registry::index::ResolvableNames;
use crate::module::traits::ModuleHost;
use crate::utils::error::{expected_to_option, log_error};

/// File that looked like a module but could not be indexed
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning one directory
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub names: ResolvableNames,
    pub skipped: Vec<SkippedFile>,
}

/// Module discovery scanner
pub struct ModuleDiscovery {
    /// Directory to scan (not recursed into)
    directory: PathBuf,
    /// Module file extension, without the dot
    extension: String,
}

impl ModuleDiscovery {
    pub fn new<P: AsRef<Path>>(directory: P, extension: &str) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            extension: extension.to_string(),
        }
    }

    fn has_module_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Scan the directory
    ///
    /// Never fails: a missing or unreadable directory yields an empty report
    /// and files that are not modules are recorded as skipped.
    pub fn scan(&self, host: &dyn ModuleHost) -> ScanReport {
        let mut report = ScanReport::default();

        if !self.directory.is_dir() {
            debug!("Module directory {:?} does not exist, index left empty", self.directory);
            return report;
        }

        let Some(entries) = log_error(
            || fs::read_dir(&self.directory),
            &format!("Failed to read module directory {:?}", self.directory),
        ) else {
            return report;
        };

        for entry in entries {
            let context = format!("Failed to read entry in {:?}", self.directory);
            let Some(path) = expected_to_option(entry, &context).map(|entry| entry.path()) else {
                continue;
            };

            if !self.has_module_extension(&path) || !path.is_file() {
                continue;
            }

            let name = match host
                .read_short_name(&path)
                .map_err(|e| e.to_string())
                .and_then(|name| validate_short_name(&name).map(|_| name))
            {
                Ok(name) => name,
                Err(reason) => {
                    debug!("Skipping {:?}: {}", path, reason);
                    report.skipped.push(SkippedFile { path, reason });
                    continue;
                }
            };

            if !report.names.insert_scanned(&name, &path, &self.extension) {
                debug!("Short name {} in {:?} already indexed, ignoring", name, path);
            }
        }

        info!(
            "Indexed {} modules in {:?} ({} skipped)",
            report.names.len(),
            self.directory,
            report.skipped.len()
        );
        report
    }

    /// Scan and keep only the index
    pub fn discover_names(&self, host: &dyn ModuleHost) -> ResolvableNames {
        self.scan(host).names
    }
}
