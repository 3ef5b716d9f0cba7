//! Tool description entities.
//!
//! Ownership is a tree rooted at [`Tool`]. Owned entities carry non-owning
//! back-references (`ToolId`, `TaskId`) that the loader assigns exactly once.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::emit::{Emit, default_settable, no_settable, settable_only};
use super::reference::Reference;

/// Lookup handle for the owning tool (its unique name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolId(String);

impl ToolId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup handle for the owning task (its index in `Tool::tasks`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub usize);

/// Root entity: one external command-line tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub official_url: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub package_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub environment_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub data_classes: Vec<DataClass>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub enumerations: Vec<Enumeration>,

    #[serde(skip)]
    pub(crate) definition_file: PathBuf,
    #[serde(skip)]
    pub(crate) generation_file_base: PathBuf,
    #[serde(skip)]
    pub(crate) repository_url: String,
}

impl Tool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> ToolId {
        ToolId::new(self.name.clone())
    }

    /// The description file this tool was loaded from.
    pub fn definition_file(&self) -> &Path {
        &self.definition_file
    }

    /// `<output root>/<Name>/<file stem>`; generated files append suffixes to it.
    pub fn generation_file_base(&self) -> &Path {
        &self.generation_file_base
    }

    /// Public location of the description, quoted in generated headers.
    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    /// File name of the description, used in user-facing messages.
    pub fn definition_file_name(&self) -> String {
        self.definition_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Path of a generated artifact: the generation base plus `suffix`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let mut path = self.generation_file_base.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    /// Archive path for the reference at `index`.
    pub fn reference_path(&self, index: usize) -> PathBuf {
        self.output_path(&format!(".ref.{:03}.txt", index))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations.iter().find(|e| e.name == name)
    }

    pub fn data_class(&self, name: &str) -> Option<&DataClass> {
        self.data_classes.iter().find(|d| d.name == name)
    }
}

/// One invocable operation of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub postfix: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub definitive_argument: Option<String>,
    pub settings_class: SettingsClass,

    #[serde(skip)]
    pub(crate) tool: OnceLock<ToolId>,
}

impl Task {
    pub fn new(settings_class: SettingsClass) -> Self {
        Self {
            settings_class,
            ..Default::default()
        }
    }

    pub fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = Some(postfix.into());
        self
    }

    pub fn with_definitive_argument(mut self, argument: impl Into<String>) -> Self {
        self.definitive_argument = Some(argument.into());
        self
    }

    pub fn tool(&self) -> Option<&ToolId> {
        self.tool.get()
    }

    pub fn postfix(&self) -> &str {
        self.postfix.as_deref().unwrap_or_default()
    }
}

/// Settings of one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsClass {
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "no_settable", serialize_with = "settable_only")]
    pub properties: Vec<Property>,

    #[serde(skip)]
    pub(crate) tool: OnceLock<ToolId>,
    #[serde(skip)]
    pub(crate) task: OnceLock<TaskId>,
}

impl SettingsClass {
    pub fn new(properties: Vec<Property>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(properties)
        }
    }

    pub fn tool(&self) -> Option<&ToolId> {
        self.tool.get()
    }

    pub fn task(&self) -> Option<TaskId> {
        self.task.get().copied()
    }

    /// Declared name, or `<Tool><Postfix>Settings` when none is declared.
    pub fn effective_name(&self, tool: &Tool) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let postfix = self.task().and_then(|id| tool.task(id)).map(Task::postfix).unwrap_or_default();
        format!("{}{}Settings", tool.name, postfix)
    }
}

/// A named structural type used as a property type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "no_settable", serialize_with = "settable_only")]
    pub properties: Vec<Property>,

    #[serde(skip)]
    pub(crate) tool: OnceLock<ToolId>,
}

impl DataClass {
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            properties,
            ..Default::default()
        }
    }

    pub fn tool(&self) -> Option<&ToolId> {
        self.tool.get()
    }
}

/// One member of a settings or data class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    /// Read-only members never reach the canonical form, so this is always
    /// `true` whenever a property is written.
    #[serde(default = "default_settable", skip_serializing)]
    pub settable: bool,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub default: Value,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub secret: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            settable: true,
            default: Value::Null,
            format: None,
            help: None,
            secret: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self
    }

    /// True when this property appears in the canonical description.
    pub fn is_emitted(&self) -> bool {
        self.settable
    }
}

/// A closed set of string values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Enumeration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Emit::is_default")]
    pub values: Vec<String>,

    #[serde(skip)]
    pub(crate) tool: OnceLock<ToolId>,
}

impl Enumeration {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            ..Default::default()
        }
    }

    pub fn tool(&self) -> Option<&ToolId> {
        self.tool.get()
    }
}
