//! Code Renderer - deterministic model-to-source translation.
//!
//! A renderer receives a fully loaded, read-only [`Tool`] and returns the
//! complete text of `<output-base>.Generated.<ext>`. Identical models must
//! produce byte-identical text.

mod naming;
mod rust;
mod templates;

use std::path::PathBuf;

use log::debug;

use crate::error::{Result, ToolgenError};
use crate::model::Tool;

pub use naming::{TypeShape, to_pascal_case, to_snake_case, type_shape};
pub use rust::RustRenderer;

/// Model-to-text contract for generated wrappers.
pub trait Renderer: Send + Sync {
    /// File extension of the generated source, without the dot.
    fn extension(&self) -> &str;

    /// Produce the generated source for `tool`.
    fn render(&self, tool: &Tool) -> Result<String>;
}

/// `<output-base>.Generated.<ext>`
pub fn generated_path(tool: &Tool, renderer: &dyn Renderer) -> PathBuf {
    tool.output_path(&format!(".Generated.{}", renderer.extension()))
}

/// Render, optionally rendering twice to enforce determinism.
pub fn render_checked(renderer: &dyn Renderer, tool: &Tool, verify_determinism: bool) -> Result<String> {
    let content = renderer.render(tool)?;
    if verify_determinism {
        let again = renderer.render(tool)?;
        if again != content {
            return Err(ToolgenError::render(
                tool.definition_file_name(),
                "renderer produced different output for the same model",
            ));
        }
        debug!("Determinism check passed for {}", tool.name);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl Renderer for Counting {
        fn extension(&self) -> &str {
            "txt"
        }

        fn render(&self, tool: &Tool) -> Result<String> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} {}", tool.name, n))
        }
    }

    struct Fixed;

    impl Renderer for Fixed {
        fn extension(&self) -> &str {
            "txt"
        }

        fn render(&self, tool: &Tool) -> Result<String> {
            Ok(tool.name.clone())
        }
    }

    #[test]
    fn test_generated_path() {
        let mut tool = Tool::new("Foo");
        tool.generation_file_base = PathBuf::from("Foo/Foo");
        assert_eq!(generated_path(&tool, &Fixed), PathBuf::from("Foo/Foo.Generated.txt"));
    }

    #[test]
    fn test_render_checked_accepts_deterministic_renderer() {
        let tool = Tool::new("Foo");
        assert_eq!(render_checked(&Fixed, &tool, true).unwrap(), "Foo");
    }

    #[test]
    fn test_render_checked_rejects_non_deterministic_renderer() {
        let tool = Tool::new("Foo");
        let renderer = Counting(AtomicUsize::new(0));
        let err = render_checked(&renderer, &tool, true).unwrap_err();
        assert!(matches!(err, ToolgenError::Render { .. }));
    }

    #[test]
    fn test_render_checked_without_verification_renders_once() {
        let tool = Tool::new("Foo");
        let renderer = Counting(AtomicUsize::new(0));
        assert_eq!(render_checked(&renderer, &tool, false).unwrap(), "Foo 0");
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
    }
}
