//! Module image format
//!
//! Reference on-disk layout for loadable modules:
//!
//! ```text
//! +-------+----------------+---------------------+-----------------+
//! | AMOD  | header len u32 | bincode ModuleHeader| payload ...     |
//! +-------+----------------+---------------------+-----------------+
//! ```
//!
//! The header length is little-endian. The header is small and sits at the
//! front of the file, so reading a short name never touches the payload.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::module::traits::{LoadedModule, ModuleHost, ResolverError};

/// Leading magic of every module image
pub const IMAGE_MAGIC: [u8; 4] = *b"AMOD";

/// Default upper bound on the encoded header size
pub const DEFAULT_MAX_HEADER_LEN: u32 = 64 * 1024;

const PREAMBLE_LEN: usize = IMAGE_MAGIC.len() + 4;

/// Identity a module declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// Short name used by load requests
    pub name: String,
    pub version: String,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
}

impl ModuleHeader {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            culture: None,
            public_key_token: None,
        }
    }

    /// Check the declared short name can safely become a file stem
    pub fn validate(&self) -> Result<(), String> {
        validate_short_name(&self.name)
    }
}

/// Reject short names that could not name a file inside a single directory
///
/// A name that passes this check joined onto a directory always yields a
/// path whose parent is that directory.
pub fn validate_short_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("short name is empty".to_string());
    }
    if name.trim() != name {
        return Err(format!("short name {:?} has surrounding whitespace", name));
    }
    if name == "." || name == ".." || name.contains("..") {
        return Err(format!("short name {:?} contains a parent reference", name));
    }
    if name.contains(['/', '\\', ':']) {
        return Err(format!("short name {:?} contains a path separator", name));
    }
    if name.chars().any(char::is_control) {
        return Err(format!("short name {:?} contains control characters", name));
    }
    Ok(())
}

fn header_codec(max_header_len: u32) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(u64::from(max_header_len))
}

/// Encode a header and payload into image bytes
pub fn encode_image(header: &ModuleHeader, payload: &[u8]) -> Result<Vec<u8>, ResolverError> {
    header
        .validate()
        .map_err(ResolverError::InvalidArgument)?;

    let encoded = header_codec(DEFAULT_MAX_HEADER_LEN).serialize(header)?;
    let header_len = u32::try_from(encoded.len()).map_err(|_| {
        ResolverError::InvalidArgument("module header too large".to_string())
    })?;

    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + encoded.len() + payload.len());
    bytes.extend_from_slice(&IMAGE_MAGIC);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(&encoded);
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Write a module image to `path`
pub fn write_image<P: AsRef<Path>>(
    path: P,
    header: &ModuleHeader,
    payload: &[u8],
) -> Result<(), ResolverError> {
    let bytes = encode_image(header, payload)?;
    fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Decode the preamble, returning the declared header length
fn decode_preamble(preamble: &[u8], max_header_len: u32) -> Result<usize, String> {
    if preamble.len() < PREAMBLE_LEN {
        return Err("file too short for a module image".to_string());
    }
    if preamble[..IMAGE_MAGIC.len()] != IMAGE_MAGIC {
        return Err("missing module image magic".to_string());
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&preamble[IMAGE_MAGIC.len()..PREAMBLE_LEN]);
    let header_len = u32::from_le_bytes(len_bytes);
    if header_len == 0 || header_len > max_header_len {
        return Err(format!(
            "header length {} outside 1..={}",
            header_len, max_header_len
        ));
    }
    Ok(header_len as usize)
}

fn decode_header(bytes: &[u8], max_header_len: u32) -> Result<ModuleHeader, String> {
    let header: ModuleHeader = header_codec(max_header_len)
        .deserialize(bytes)
        .map_err(|e| e.to_string())?;
    header.validate()?;
    Ok(header)
}

/// `ModuleHost` over the module image format
#[derive(Debug, Clone)]
pub struct ImageHost {
    max_header_len: u32,
}

impl ImageHost {
    pub fn new() -> Self {
        Self {
            max_header_len: DEFAULT_MAX_HEADER_LEN,
        }
    }

    pub fn with_max_header_len(max_header_len: u32) -> Self {
        Self { max_header_len }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_max_header_len(config.max_header_len)
    }

    /// Read only the header of the image at `path`
    pub fn read_header(&self, path: &Path) -> Result<ModuleHeader, ResolverError> {
        let invalid = |reason: String| ResolverError::InvalidHeader {
            path: path.to_path_buf(),
            reason,
        };

        let mut file = File::open(path)?;
        let mut preamble = [0u8; PREAMBLE_LEN];
        file.read_exact(&mut preamble)
            .map_err(|e| invalid(format!("reading preamble: {}", e)))?;
        let header_len = decode_preamble(&preamble, self.max_header_len).map_err(invalid)?;

        let mut encoded = vec![0u8; header_len];
        file.read_exact(&mut encoded)
            .map_err(|e| invalid(format!("reading header: {}", e)))?;
        decode_header(&encoded, self.max_header_len).map_err(invalid)
    }
}

impl Default for ImageHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleHost for ImageHost {
    fn read_short_name(&self, path: &Path) -> Result<String, ResolverError> {
        self.read_header(path).map(|header| header.name)
    }

    fn load_from(&self, path: &Path) -> Result<Arc<LoadedModule>, ResolverError> {
        let failed = |reason: String| ResolverError::LoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| failed(e.to_string()))?;
        let header_len = decode_preamble(&bytes, self.max_header_len).map_err(failed)?;
        let header_end = PREAMBLE_LEN
            .checked_add(header_len)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| failed("header extends past end of file".to_string()))?;
        let header = decode_header(&bytes[PREAMBLE_LEN..header_end], self.max_header_len)
            .map_err(failed)?;

        debug!("Loaded module {} {} from {:?}", header.name, header.version, path);

        Ok(Arc::new(LoadedModule {
            header,
            path: PathBuf::from(path),
            payload: bytes[header_end..].to_vec(),
        }))
    }
}
