//! Definition Loader - parse one description file into a wired [`Tool`].
//!
//! The loader is the only place a model is mutated: it fills in the derived
//! paths and assigns every back-reference exactly once.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;

use crate::error::{Result, ToolgenError};
use crate::model::{Property, TaskId, Tool};

/// Provenance base used when the configuration does not name one.
pub const DEFAULT_PROVENANCE_BASE_URL: &str = "https://github.com/toolgen/tools/blob/master";

/// Where and how the loader derives a tool's output location.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory under which `<Tool.Name>/` is created.
    pub output_root: PathBuf,
    /// Prefix of the provenance URL; the description file name is appended.
    pub provenance_base_url: String,
    /// Create the tool's output directory (disabled for dry runs).
    pub create_dirs: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            provenance_base_url: DEFAULT_PROVENANCE_BASE_URL.to_string(),
            create_dirs: true,
        }
    }
}

impl LoadOptions {
    pub fn with_output_root(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }
}

/// Load a description file. No partially wired model is ever returned.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Tool> {
    let content = fs::read_to_string(path).map_err(|e| ToolgenError::load(path, e))?;
    let mut tool: Tool = serde_json::from_str(&content).map_err(|e| ToolgenError::load(path, e))?;

    validate(&tool).map_err(|reason| ToolgenError::load(path, reason))?;

    let directory = options.output_root.join(&tool.name);
    if options.create_dirs {
        fs::create_dir_all(&directory).map_err(|e| {
            ToolgenError::load(path, format!("cannot create {}: {}", directory.display(), e))
        })?;
    }

    let stem = path
        .file_stem()
        .ok_or_else(|| ToolgenError::load(path, "path has no file name"))?;
    let file_name = path.file_name().unwrap_or(stem).to_string_lossy();

    tool.definition_file = path.to_path_buf();
    tool.generation_file_base = directory.join(stem);
    tool.repository_url = format!(
        "{}/{}",
        options.provenance_base_url.trim_end_matches('/'),
        file_name
    );

    wire(&tool).map_err(|reason| ToolgenError::load(path, reason))?;

    debug!(
        "Loaded tool '{}' from {} ({} tasks, {} references)",
        tool.name,
        path.display(),
        tool.tasks.len(),
        tool.references.len()
    );
    Ok(tool)
}

/// Structural checks serde cannot express.
fn validate(tool: &Tool) -> std::result::Result<(), String> {
    let name = tool.name.trim();
    if name.is_empty() {
        return Err("tool Name must not be empty".to_string());
    }
    if name == "." || name == ".." || tool.name.contains(['/', '\\']) {
        return Err(format!("tool Name '{}' is not usable as a directory name", tool.name));
    }

    for task in &tool.tasks {
        let owner = task.settings_class.name.clone().unwrap_or_else(|| format!("{} task", tool.name));
        unique_properties(&owner, &task.settings_class.properties)?;
    }
    for data_class in &tool.data_classes {
        unique_properties(&data_class.name, &data_class.properties)?;
    }
    for enumeration in &tool.enumerations {
        let mut seen = HashSet::new();
        if let Some(dup) = enumeration.values.iter().find(|v| !seen.insert(v.as_str())) {
            return Err(format!("duplicate value '{}' in enumeration {}", dup, enumeration.name));
        }
    }
    Ok(())
}

fn unique_properties(owner: &str, properties: &[Property]) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    match properties.iter().find(|p| !seen.insert(p.name.as_str())) {
        Some(dup) => Err(format!("duplicate property '{}' in {}", dup.name, owner)),
        None => Ok(()),
    }
}

/// Assign the non-owning back-references of every nested entity.
fn wire(tool: &Tool) -> std::result::Result<(), String> {
    let id = tool.id();
    for (index, task) in tool.tasks.iter().enumerate() {
        assign(&task.tool, id.clone())?;
        assign(&task.settings_class.tool, id.clone())?;
        assign(&task.settings_class.task, TaskId(index))?;
    }
    for data_class in &tool.data_classes {
        assign(&data_class.tool, id.clone())?;
    }
    for enumeration in &tool.enumerations {
        assign(&enumeration.tool, id.clone())?;
    }
    Ok(())
}

fn assign<T>(cell: &OnceLock<T>, value: T) -> std::result::Result<(), String> {
    cell.set(value).map_err(|_| "back-reference assigned twice".to_string())
}
