//! toolgen - compile declarative tool descriptions into typed wrappers.
//!
//! Each `*.json` description in a directory is loaded into a [`model::Tool`],
//! rendered to `<Name>/<file>.Generated.rs`, has its reference documents
//! archived next to it, and is written back in canonical form.

pub mod driver;
pub mod error;
pub mod loader;
pub mod model;
pub mod render;
pub mod serializer;
pub mod sync;

pub use error::{Result, ToolgenError};
