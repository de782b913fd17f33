//! Resolvable-name index
//!
//! Case-insensitive membership set of the short names an add-in ships. Keys
//! are case-folded; each key remembers the spelling the module declared so the
//! candidate file name matches what is on disk.

use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
struct Entry {
    declared: String,
    /// `<declared>.<ext>` is the name of the file it was read from
    on_disk: bool,
}

/// Case-insensitive set of short module names
///
/// Built once and only read afterwards, so it is shared between threads
/// without locking.
#[derive(Debug, Clone, Default)]
pub struct ResolvableNames {
    names: HashMap<String, Entry>,
}

impl ResolvableNames {
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(name: &str) -> String {
        name.to_lowercase()
    }

    /// Insert a declared short name
    ///
    /// Returns `false` if a name differing only in case is already present; the
    /// first spelling wins.
    pub fn insert(&mut self, name: &str) -> bool {
        self.insert_entry(name, false)
    }

    /// Insert a short name declared by the module file at `file`
    ///
    /// Among spellings differing only in case, one whose `<name>.<extension>`
    /// is exactly the file name it was read from replaces one that is not, so
    /// the indexed spelling points at a file that exists whatever order the
    /// directory was listed in. Returns `false` if the name was not taken.
    pub fn insert_scanned(&mut self, name: &str, file: &Path, extension: &str) -> bool {
        let expected = format!("{}.{}", name, extension);
        let on_disk = file
            .file_name()
            .map(|file_name| file_name == expected.as_str())
            .unwrap_or(false);
        self.insert_entry(name, on_disk)
    }

    fn insert_entry(&mut self, name: &str, on_disk: bool) -> bool {
        let key = Self::fold(name);
        if let Some(existing) = self.names.get(&key) {
            if existing.on_disk || !on_disk {
                return false;
            }
        }
        self.names.insert(
            key,
            Entry {
                declared: name.to_string(),
                on_disk,
            },
        );
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&Self::fold(name))
    }

    /// Declared spelling of `name`, if indexed
    pub fn declared(&self, name: &str) -> Option<&str> {
        self.names
            .get(&Self::fold(name))
            .map(|entry| entry.declared.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Declared spellings, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(|entry| entry.declared.as_str())
    }
}

impl<'a> FromIterator<&'a str> for ResolvableNames {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut names = Self::new();
        for name in iter {
            names.insert(name);
        }
        names
    }
}
