//! Resolution request parsing
//!
//! A request names a module by short name, optionally followed by
//! comma-separated `Key=Value` qualifiers:
//!
//! ```text
//! Foo
//! Foo, Version=1.2.3.4, Culture=neutral, PublicKeyToken=b77a5c561934e089
//! ```
//!
//! Only the short name takes part in resolution decisions. A comma inside the
//! name must be escaped as `\,`.

use std::fmt;
use std::str::FromStr;

use crate::module::traits::ResolverError;

/// Parsed resolution request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleRequest {
    /// Short name of the requested module
    pub name: String,
    pub version: Option<String>,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
    /// Qualifiers with unrecognised keys, in request order
    pub extra: Vec<(String, String)>,
}

impl ModuleRequest {
    /// Request for a bare short name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a full request string
    ///
    /// A qualifier without `=` (`Foo, Culture`) makes the whole request
    /// malformed, as the host's own request parser treats it.
    pub fn parse(request: &str) -> Result<Self, ResolverError> {
        let mut segments = split_unescaped(request).into_iter();

        let name = segments
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            return Err(ResolverError::InvalidRequest(format!(
                "missing short name in {:?}",
                request
            )));
        }

        let mut parsed = Self::named(name);
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                ResolverError::InvalidRequest(format!(
                    "qualifier {:?} is not of the form Key=Value",
                    segment
                ))
            })?;
            let key = key.trim();
            let value = value.trim().to_string();

            match key.to_ascii_lowercase().as_str() {
                "version" => parsed.version = Some(value),
                "culture" => parsed.culture = Some(value),
                "publickeytoken" => parsed.public_key_token = Some(value),
                _ => parsed.extra.push((key.to_string(), value)),
            }
        }

        Ok(parsed)
    }

    /// Extract only the short name from a request string
    pub fn short_name(request: &str) -> Result<String, ResolverError> {
        Self::parse(request).map(|r| r.name)
    }
}

impl FromStr for ModuleRequest {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.replace('\\', "\\\\").replace(',', "\\,"))?;
        if let Some(version) = &self.version {
            write!(f, ", Version={}", version)?;
        }
        if let Some(culture) = &self.culture {
            write!(f, ", Culture={}", culture)?;
        }
        if let Some(token) = &self.public_key_token {
            write!(f, ", PublicKeyToken={}", token)?;
        }
        for (key, value) in &self.extra {
            write!(f, ", {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Split on commas not preceded by a backslash, unescaping `\,` and `\\`
fn split_unescaped(input: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ (',' | '\\')) => current.push(next),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}
