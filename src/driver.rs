//! Driver - run the full pipeline over every description in a directory.
//!
//! Files are processed one after another: load, render, synchronize
//! references, serialize back. Each file ends in its own [`FileOutcome`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use sha2::{Digest, Sha256};

use crate::error::{Result, ToolgenError};
use crate::loader::{self, LoadOptions};
use crate::model::Tool;
use crate::render::{self, Renderer};
use crate::serializer::{self, SaveOutcome};
use crate::sync::{ReferenceOutcome, ReferenceStatus, ReferenceSynchronizer};

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub load: LoadOptions,
    pub verify_determinism: bool,
    pub references: bool,
    pub dry_run: bool,
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            verify_determinism: false,
            references: true,
            dry_run: false,
            fail_fast: false,
        }
    }
}

/// Console hooks for a run. The library never prints by itself.
pub trait Progress: Send + Sync {
    /// Before a file is loaded.
    fn file_started(&self, file: &Path);
    /// A reference of the current file failed.
    fn reference_failed(&self, message: &str);
    /// A file failed as a whole.
    fn file_failed(&self, file: &Path, error: &ToolgenError);
    /// After the last file.
    fn finished(&self, report: &RunReport);
}

/// Silent progress, for library callers and tests.
pub struct NoProgress;

impl Progress for NoProgress {
    fn file_started(&self, _file: &Path) {}
    fn reference_failed(&self, _message: &str) {}
    fn file_failed(&self, _file: &Path, _error: &ToolgenError) {}
    fn finished(&self, _report: &RunReport) {}
}

/// The generated source written (or planned) for one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    /// Hex SHA-256 of the content.
    pub sha256: String,
    pub bytes: usize,
}

/// Everything produced for one successfully processed description.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub tool: String,
    pub generated: GeneratedFile,
    pub references: Vec<ReferenceOutcome>,
    pub saved: SaveOutcome,
}

impl FileReport {
    pub fn failed_references(&self) -> usize {
        self.references.iter().filter(|r| r.failed()).count()
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub result: Result<FileReport>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
    pub dry_run: bool,
    /// Set when `fail_fast` cut the run short.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || self.stopped_early
    }

    pub fn failed_references(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(FileReport::failed_references)
            .sum()
    }
}

/// Top-level `*.json` files of `dir`, sorted by path.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ToolgenError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", dir.display()),
        )));
    }

    let mut files: Vec<PathBuf> = glob::glob(&json_pattern(dir))
        .map_err(|e| ToolgenError::Io(std::io::Error::other(e.to_string())))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// `<dir>/*.json` with glob metacharacters in `dir` escaped.
fn json_pattern(dir: &Path) -> String {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    format!("{}/*.json", escaped.trim_end_matches('/'))
}

pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Runs the pipeline with one renderer and one reference synchronizer.
pub struct Driver {
    renderer: Arc<dyn Renderer>,
    synchronizer: ReferenceSynchronizer,
    options: RunOptions,
}

impl Driver {
    pub fn new(renderer: Arc<dyn Renderer>, synchronizer: ReferenceSynchronizer, options: RunOptions) -> Self {
        Self {
            renderer,
            synchronizer,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process every description in `dir`.
    pub async fn run(&self, dir: &Path, progress: &dyn Progress) -> Result<RunReport> {
        let files = discover(dir)?;
        info!("Found {} description files in {}", files.len(), dir.display());
        Ok(self.run_files(&files, progress).await)
    }

    /// Process `files` in order.
    pub async fn run_files(&self, files: &[PathBuf], progress: &dyn Progress) -> RunReport {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        let mut owners: HashMap<String, PathBuf> = HashMap::new();

        for file in files {
            progress.file_started(file);
            let result = self.process(file, &mut owners, progress).await;

            if let Err(e) = &result {
                error!("{}", e);
                progress.file_failed(file, e);
            }
            let failed = result.is_err();
            report.outcomes.push(FileOutcome {
                file: file.clone(),
                result,
            });

            if failed && self.options.fail_fast {
                warn!("Stopping after first failure ({})", file.display());
                report.stopped_early = true;
                break;
            }
        }

        info!(
            "Run finished: {} succeeded, {} failed, {} reference failures",
            report.succeeded(),
            report.failed(),
            report.failed_references()
        );
        progress.finished(&report);
        report
    }

    async fn process(
        &self,
        file: &Path,
        owners: &mut HashMap<String, PathBuf>,
        progress: &dyn Progress,
    ) -> Result<FileReport> {
        let load_options = LoadOptions {
            create_dirs: !self.options.dry_run,
            ..self.options.load.clone()
        };
        let tool = loader::load(file, &load_options)?;
        claim_name(&tool, file, owners)?;

        let generated = self.generate(&tool)?;

        let references = if !self.options.references {
            Vec::new()
        } else if self.options.dry_run {
            self.synchronizer.plan(&tool)
        } else {
            self.synchronizer.synchronize(&tool).await
        };
        for outcome in &references {
            if let ReferenceStatus::Failed(message) = &outcome.status {
                progress.reference_failed(message);
            }
        }

        let saved = serializer::save(&tool, self.options.dry_run)?;

        Ok(FileReport {
            tool: tool.name.clone(),
            generated,
            references,
            saved,
        })
    }

    fn generate(&self, tool: &Tool) -> Result<GeneratedFile> {
        let content = render::render_checked(self.renderer.as_ref(), tool, self.options.verify_determinism)?;
        let path = render::generated_path(tool, self.renderer.as_ref());
        if self.options.dry_run {
            info!("Dry run: would write {}", path.display());
        } else {
            fs::write(&path, &content).map_err(|e| {
                ToolgenError::render(
                    tool.definition_file_name(),
                    format!("cannot write {}: {}", path.display(), e),
                )
            })?;
        }
        Ok(GeneratedFile {
            sha256: sha256_hex(content.as_bytes()),
            bytes: content.len(),
            path,
        })
    }
}

/// Tool names map to output directories, so two files may not share one.
fn claim_name(tool: &Tool, file: &Path, owners: &mut HashMap<String, PathBuf>) -> Result<()> {
    if let Some(first) = owners.get(&tool.name) {
        return Err(ToolgenError::load(
            file,
            format!("tool name '{}' already used by {}", tool.name, first.display()),
        ));
    }
    owners.insert(tool.name.clone(), file.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RustRenderer;
    use crate::sync::StaticFetcher;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Progress for Recorder {
        fn file_started(&self, file: &Path) {
            let name = file.file_name().unwrap().to_string_lossy().into_owned();
            self.events.lock().unwrap().push(format!("start {}", name));
        }
        fn reference_failed(&self, message: &str) {
            self.events.lock().unwrap().push(format!("ref {}", message));
        }
        fn file_failed(&self, file: &Path, _error: &ToolgenError) {
            let name = file.file_name().unwrap().to_string_lossy().into_owned();
            self.events.lock().unwrap().push(format!("fail {}", name));
        }
        fn finished(&self, report: &RunReport) {
            self.events.lock().unwrap().push(format!("done {}", report.outcomes.len()));
        }
    }

    fn driver(dir: &TempDir, options: RunOptions) -> Driver {
        let options = RunOptions {
            load: LoadOptions::with_output_root(dir.path().join("out")),
            ..options
        };
        Driver::new(
            Arc::new(RustRenderer::new().unwrap()),
            ReferenceSynchronizer::new(Arc::new(StaticFetcher::new())),
            options,
        )
    }

    fn defs(dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
        let defs = dir.path().join("defs");
        fs::create_dir_all(&defs).unwrap();
        for (name, content) in files {
            fs::write(defs.join(name), content).unwrap();
        }
        defs
    }

    #[test]
    fn test_discover_is_top_level_json_only() {
        let dir = TempDir::new().unwrap();
        let defs = defs(&dir, &[("B.json", "{}"), ("A.json", "{}"), ("notes.txt", "")]);
        fs::create_dir_all(defs.join("nested")).unwrap();
        fs::write(defs.join("nested").join("C.json"), "{}").unwrap();

        let found = discover(&defs).unwrap();
        assert_eq!(found, vec![defs.join("A.json"), defs.join("B.json")]);
    }

    #[test]
    fn test_discover_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_bad_file_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let defs = defs(&dir, &[("A.json", "{ broken"), ("B.json", "{\n  \"Name\": \"Bar\"\n}\n")]);
        let recorder = Recorder::default();

        let report = driver(&dir, RunOptions::default()).run(&defs, &recorder).await.unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(dir.path().join("out").join("Bar").join("B.Generated.rs").exists());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start A.json", "fail A.json", "start B.json", "done 2"]
        );
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let defs = defs(&dir, &[("A.json", "{ broken"), ("B.json", "{\n  \"Name\": \"Bar\"\n}\n")]);
        let options = RunOptions {
            fail_fast: true,
            ..Default::default()
        };

        let report = driver(&dir, options).run(&defs, &NoProgress).await.unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.stopped_early);
        assert!(report.has_failures());
        assert!(!dir.path().join("out").join("Bar").exists());
    }

    #[tokio::test]
    async fn test_duplicate_tool_name_fails_later_file() {
        let dir = TempDir::new().unwrap();
        let defs = defs(
            &dir,
            &[("A.json", "{\n  \"Name\": \"Foo\"\n}\n"), ("B.json", "{\n  \"Name\": \"Foo\"\n}\n")],
        );

        let report = driver(&dir, RunOptions::default()).run(&defs, &NoProgress).await.unwrap();
        assert!(report.outcomes[0].is_ok());
        let err = report.outcomes[1].result.as_ref().unwrap_err();
        assert!(err.to_string().contains("already used"));
    }

    #[tokio::test]
    async fn test_reference_failures_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let defs = defs(
            &dir,
            &[(
                "Foo.json",
                "{\n  \"Name\": \"Foo\",\n  \"References\": [\n    \"http://nowhere.example.com/x\"\n  ]\n}\n",
            )],
        );
        let recorder = Recorder::default();

        let report = driver(&dir, RunOptions::default()).run(&defs, &recorder).await.unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed_references(), 1);
        assert!(!report.has_failures());
        let events = recorder.events.lock().unwrap();
        assert!(events[1].starts_with("ref Couldn't update reference #0 for Foo.json"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let original = "{ \"Name\": \"Foo\", \"References\": [\"http://example.com/a\"] }";
        let defs = defs(&dir, &[("Foo.json", original)]);
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = driver(&dir, options).run(&defs, &NoProgress).await.unwrap();
        let file = report.outcomes[0].result.as_ref().unwrap();
        assert_eq!(file.references.len(), 1);
        assert!(!file.saved.written);
        assert_eq!(file.generated.sha256.len(), 64);
        assert!(!dir.path().join("out").exists());
        assert_eq!(fs::read_to_string(defs.join("Foo.json")).unwrap(), original);
        assert!(!defs.join("Foo.json.new").exists());
    }

    #[tokio::test]
    async fn test_unwritable_generated_file_is_render_error() {
        let dir = TempDir::new().unwrap();
        let defs = defs(&dir, &[("Foo.json", "{\n  \"Name\": \"Foo\"\n}\n")]);
        fs::create_dir_all(dir.path().join("out").join("Foo").join("Foo.Generated.rs")).unwrap();

        let report = driver(&dir, RunOptions::default()).run(&defs, &NoProgress).await.unwrap();
        let err = report.outcomes[0].result.as_ref().unwrap_err();
        assert!(matches!(err, ToolgenError::Render { file, reason } if file == "Foo.json" && reason.contains("cannot write")));
    }

    #[tokio::test]
    async fn test_references_can_be_skipped() {
        let dir = TempDir::new().unwrap();
        let defs = defs(
            &dir,
            &[("Foo.json", "{\n  \"Name\": \"Foo\",\n  \"References\": [\n    \"http://nowhere.example.com/x\"\n  ]\n}\n")],
        );
        let options = RunOptions {
            references: false,
            ..Default::default()
        };

        let report = driver(&dir, options).run(&defs, &NoProgress).await.unwrap();
        let file = report.outcomes[0].result.as_ref().unwrap();
        assert!(file.references.is_empty());
    }
}
