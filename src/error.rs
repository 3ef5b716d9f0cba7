//! Error types for toolgen
//!
//! Centralized error handling using thiserror.

use std::path::Path;

use thiserror::Error;

/// All error types that can occur while compiling tool descriptions
#[derive(Debug, Error)]
pub enum ToolgenError {
    /// Description file unreadable, malformed, or structurally invalid
    #[error("Failed to load {file}: {reason}")]
    Load { file: String, reason: String },

    /// Renderer failed or broke its determinism contract
    #[error("Failed to render {file}: {reason}")]
    Render { file: String, reason: String },

    /// One reference could not be fetched, extracted, or archived
    #[error("Couldn't update reference #{index} for {file}: {reason}")]
    ReferenceFetch { index: usize, file: String, reason: String },

    /// Writing the canonical description or a generated artifact failed
    #[error("Failed to write {file}: {reason}")]
    Serialize { file: String, reason: String },

    /// Reference selector outside the supported grammar
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    /// HTTP client or transfer error
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolgenError {
    pub fn load(path: &Path, reason: impl ToString) -> Self {
        Self::Load {
            file: display_name(path),
            reason: reason.to_string(),
        }
    }

    pub fn render(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::Render {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    pub fn reference(index: usize, file: impl Into<String>, reason: impl ToString) -> Self {
        Self::ReferenceFetch {
            index,
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    pub fn serialize(path: &Path, reason: impl ToString) -> Self {
        Self::Serialize {
            file: display_name(path),
            reason: reason.to_string(),
        }
    }

    pub fn selector(selector: impl Into<String>, reason: impl ToString) -> Self {
        Self::Selector {
            selector: selector.into(),
            reason: reason.to_string(),
        }
    }

    /// Reference failures are logged and skipped; everything else ends the file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ReferenceFetch { .. })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result type alias for toolgen operations
pub type Result<T> = std::result::Result<T, ToolgenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_error_names_file() {
        let err = ToolgenError::load(&PathBuf::from("/defs/Foo.json"), "missing field `Name`");
        assert_eq!(err.to_string(), "Failed to load Foo.json: missing field `Name`");
    }

    #[test]
    fn test_render_error() {
        let err = ToolgenError::render("Foo.json", "output differs between runs");
        assert_eq!(err.to_string(), "Failed to render Foo.json: output differs between runs");
    }

    #[test]
    fn test_reference_error_names_index_and_file() {
        let err = ToolgenError::reference(2, "Foo.json", "connection refused");
        assert_eq!(err.to_string(), "Couldn't update reference #2 for Foo.json: connection refused");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_serialize_error() {
        let err = ToolgenError::serialize(&PathBuf::from("Foo.json.new"), "permission denied");
        assert_eq!(err.to_string(), "Failed to write Foo.json.new: permission denied");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_selector_error() {
        let err = ToolgenError::selector("//div[last()]", "unsupported predicate");
        assert!(err.to_string().contains("//div[last()]"));
    }

    #[test]
    fn test_http_error() {
        let err = ToolgenError::Http("404 Not Found".to_string());
        assert_eq!(err.to_string(), "HTTP error: 404 Not Found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ToolgenError = io_err.into();
        assert!(matches!(err, ToolgenError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ToolgenError = json_err.into();
        assert!(matches!(err, ToolgenError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(ToolgenError::render("x", "test"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
