//! Definition Serializer - canonical JSON write-back with a line-count guard.
//!
//! The canonical form is pretty-printed JSON holding only meaningful values;
//! see [`crate::model::Emit`] for what counts as meaningful. When the fresh
//! text has a different number of lines than the file on disk, the original is
//! left alone and the fresh text goes to a `.new` sibling for review.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Result, ToolgenError};
use crate::model::Tool;

/// Suffix appended to the description file when the guard trips.
pub const SIBLING_SUFFIX: &str = ".new";

/// Which file the canonical text goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    /// Line counts matched; the original is replaced.
    Original,
    /// Line counts differed; the original is kept and `<file>.new` written.
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub target: SaveTarget,
    pub path: PathBuf,
    /// False for dry runs and when the original is already canonical.
    pub written: bool,
    pub original_lines: usize,
    pub fresh_lines: usize,
}

/// Canonical JSON text of `tool`, newline-terminated.
pub fn to_canonical_json(tool: &Tool) -> Result<String> {
    let mut json = serde_json::to_string_pretty(tool)?;
    json.push('\n');
    Ok(json)
}

pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

/// `<file>.new`
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut sibling = path.as_os_str().to_owned();
    sibling.push(SIBLING_SUFFIX);
    PathBuf::from(sibling)
}

/// Serialize `tool` back to its description file.
pub fn save(tool: &Tool, dry_run: bool) -> Result<SaveOutcome> {
    let content = to_canonical_json(tool).map_err(|e| ToolgenError::serialize(tool.definition_file(), e))?;
    write_back(tool.definition_file(), &content, dry_run)
}

/// Apply the line-count guard and write `content` for the description at `path`.
pub fn write_back(path: &Path, content: &str, dry_run: bool) -> Result<SaveOutcome> {
    let original = fs::read_to_string(path).map_err(|e| ToolgenError::serialize(path, e))?;
    let original_lines = line_count(&original);
    let fresh_lines = line_count(content);

    let (target, destination) = if original_lines == fresh_lines {
        (SaveTarget::Original, path.to_path_buf())
    } else {
        (SaveTarget::Sibling, sibling_path(path))
    };

    if target == SaveTarget::Sibling {
        warn!(
            "{} changes line count ({} -> {}); writing {}",
            path.display(),
            original_lines,
            fresh_lines,
            destination.display()
        );
    }

    let written = if dry_run {
        info!("Dry run: would write {}", destination.display());
        false
    } else if target == SaveTarget::Original && original == content {
        debug!("{} already canonical", path.display());
        false
    } else {
        fs::write(&destination, content).map_err(|e| ToolgenError::serialize(&destination, e))?;
        debug!("Wrote {}", destination.display());
        true
    };

    Ok(SaveOutcome {
        target,
        path: destination,
        written,
        original_lines,
        fresh_lines,
    })
}
