//! External reference descriptors (`url` or `url#selector`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A provenance document to archive next to the generated source.
///
/// Stored verbatim so the description round-trips byte for byte; the URL and
/// selector are split on demand at the first `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The document URL, everything before the first `#`.
    pub fn url(&self) -> &str {
        self.0.split_once('#').map_or(self.0.as_str(), |(url, _)| url)
    }

    /// The in-document selector, everything after the first `#`.
    pub fn selector(&self) -> Option<&str> {
        self.0.split_once('#').map(|(_, selector)| selector)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reference {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
