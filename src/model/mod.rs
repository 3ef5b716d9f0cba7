//! Definition model: the in-memory entity graph for one tool description.

mod emit;
mod reference;
mod tool;

pub use emit::Emit;
pub use reference::Reference;
pub use tool::{DataClass, Enumeration, Property, SettingsClass, Task, TaskId, Tool, ToolId};
