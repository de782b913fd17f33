//! Shared fixtures for resolver integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use addin_resolver::module::image::write_image;
use addin_resolver::{ImageHost, LoadedModule, ModuleHeader, ModuleHost, ResolverError};

/// Add-in installation directory with helpers to populate it
pub struct AddinFixture {
    pub temp_dir: TempDir,
}

impl AddinFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Location of the add-in's own module, used as the construction input
    pub fn owner(&self) -> PathBuf {
        self.dir().join("MyAddin.dll")
    }

    /// Write `<file_stem>.dll` declaring `name`
    pub fn module_file(&self, file_stem: &str, name: &str, version: &str) -> PathBuf {
        let path = self.dir().join(format!("{}.dll", file_stem));
        write_image(&path, &ModuleHeader::new(name, version), version.as_bytes())
            .expect("write module image");
        path
    }

    /// Write `<name>.dll` declaring `name`
    pub fn module(&self, name: &str, version: &str) -> PathBuf {
        self.module_file(name, name, version)
    }

    /// Write an arbitrary non-module file
    pub fn junk(&self, file_name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir().join(file_name);
        std::fs::write(&path, contents).expect("write junk file");
        path
    }
}

/// ImageHost wrapper recording every load path
#[derive(Default)]
pub struct RecordingHost {
    inner: ImageHost,
    pub loads: Mutex<Vec<PathBuf>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.loads.lock().unwrap().clone()
    }
}

impl ModuleHost for RecordingHost {
    fn read_short_name(&self, path: &Path) -> Result<String, ResolverError> {
        self.inner.read_short_name(path)
    }

    fn load_from(&self, path: &Path) -> Result<Arc<LoadedModule>, ResolverError> {
        self.loads.lock().unwrap().push(path.to_path_buf());
        self.inner.load_from(path)
    }
}

/// Host whose loader always panics
pub struct PanickingHost {
    inner: ImageHost,
}

impl PanickingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: ImageHost::new(),
        })
    }
}

impl ModuleHost for PanickingHost {
    fn read_short_name(&self, path: &Path) -> Result<String, ResolverError> {
        self.inner.read_short_name(path)
    }

    fn load_from(&self, _path: &Path) -> Result<Arc<LoadedModule>, ResolverError> {
        panic!("host loader crashed")
    }
}
