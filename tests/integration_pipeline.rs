//! Pipeline integration tests
//!
//! Runs the driver over a directory of descriptions with an in-memory fetcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use toolgen::driver::{Driver, NoProgress, RunOptions, RunReport};
use toolgen::loader::LoadOptions;
use toolgen::render::RustRenderer;
use toolgen::serializer::SaveTarget;
use toolgen::sync::{ReferenceSynchronizer, StaticFetcher};

const DOC_URL: &str = "http://example.com/doc.html";
const DOC: &str = r#"<html><head><title>Foo</title></head>
<body><div id="nav">menu</div><div id="x">Foo runs things in a working directory.</div></body></html>"#;

/// The description as a person might write it: defaults spelled out, empty lists.
const FOO: &str = r#"{
  "Name": "Foo",
  "Help": "",
  "References": ["http://example.com/doc.html#//div[@id='x']"],
  "Tasks": [
    {
      "Help": null,
      "SettingsClass": {
        "Name": "FooSettings",
        "Properties": [
          { "Name": "WorkingDirectory", "Type": "string", "Default": "/tmp", "Secret": false }
        ]
      }
    }
  ],
  "DataClasses": []
}
"#;

const FOO_CANONICAL: &str = r#"{
  "Name": "Foo",
  "References": [
    "http://example.com/doc.html#//div[@id='x']"
  ],
  "Tasks": [
    {
      "SettingsClass": {
        "Name": "FooSettings",
        "Properties": [
          {
            "Name": "WorkingDirectory",
            "Type": "string",
            "Default": "/tmp"
          }
        ]
      }
    }
  ]
}
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("defs")).unwrap();
        for (name, content) in files {
            fs::write(dir.path().join("defs").join(name), content).unwrap();
        }
        Self { dir }
    }

    fn defs(&self) -> PathBuf {
        self.dir.path().join("defs")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn driver(&self, fetcher: StaticFetcher, options: RunOptions) -> Driver {
        let options = RunOptions {
            load: LoadOptions::with_output_root(self.out()),
            ..options
        };
        Driver::new(
            Arc::new(RustRenderer::new().unwrap()),
            ReferenceSynchronizer::new(Arc::new(fetcher)),
            options,
        )
    }

    async fn run(&self, fetcher: StaticFetcher) -> RunReport {
        self.driver(fetcher, RunOptions::default())
            .run(&self.defs(), &NoProgress)
            .await
            .unwrap()
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

fn doc_fetcher() -> StaticFetcher {
    StaticFetcher::new().with_document(DOC_URL, DOC)
}

#[tokio::test]
async fn test_end_to_end_foo() {
    let ws = Workspace::new(&[("Foo.json", FOO)]);
    let report = ws.run(doc_fetcher()).await;
    assert_eq!(report.succeeded(), 1);
    assert!(!report.has_failures());

    let generated = read(ws.out().join("Foo").join("Foo.Generated.rs"));
    assert!(generated.contains("pub struct FooSettings {"));
    assert!(generated.contains("/tmp"));

    assert_eq!(
        read(ws.out().join("Foo").join("Foo.ref.000.txt")),
        "Foo runs things in a working directory."
    );

    // The hand-written file is shorter than the canonical form.
    let file = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(file.saved.target, SaveTarget::Sibling);
    assert_eq!(read(ws.defs().join("Foo.json")), FOO);

    let written = read(ws.defs().join("Foo.json.new"));
    assert_eq!(written, FOO_CANONICAL);
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        value,
        json!({
            "Name": "Foo",
            "References": ["http://example.com/doc.html#//div[@id='x']"],
            "Tasks": [{ "SettingsClass": {
                "Name": "FooSettings",
                "Properties": [{ "Name": "WorkingDirectory", "Type": "string", "Default": "/tmp" }]
            }}]
        })
    );
}

#[tokio::test]
async fn test_canonical_description_is_overwritten_in_place() {
    let ws = Workspace::new(&[("Foo.json", FOO_CANONICAL)]);
    let report = ws.run(doc_fetcher()).await;

    let file = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(file.saved.target, SaveTarget::Original);
    assert_eq!(read(ws.defs().join("Foo.json")), FOO_CANONICAL);
    assert!(!ws.defs().join("Foo.json.new").exists());
}

#[tokio::test]
async fn test_second_run_is_byte_identical() {
    let ws = Workspace::new(&[("Foo.json", FOO_CANONICAL)]);
    ws.run(doc_fetcher()).await;

    let outputs = [
        ws.out().join("Foo").join("Foo.Generated.rs"),
        ws.out().join("Foo").join("Foo.ref.000.txt"),
        ws.defs().join("Foo.json"),
    ];
    let first: Vec<Vec<u8>> = outputs.iter().map(|p| fs::read(p).unwrap()).collect();

    let report = ws.run(doc_fetcher()).await;
    assert!(!report.has_failures());
    let second: Vec<Vec<u8>> = outputs.iter().map(|p| fs::read(p).unwrap()).collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unreachable_reference_is_isolated() {
    let description = r#"{
  "Name": "Bar",
  "References": [
    "http://example.com/doc.html#//div[@id='nav']",
    "http://offline.example.com/manual.html",
    "http://example.com/doc.html#//div[@id='x']"
  ]
}
"#;
    let ws = Workspace::new(&[("Bar.json", description)]);
    let report = ws.run(doc_fetcher()).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed_references(), 1);

    let dir = ws.out().join("Bar");
    assert_eq!(read(dir.join("Bar.ref.000.txt")), "menu");
    assert!(!dir.join("Bar.ref.001.txt").exists());
    assert_eq!(read(dir.join("Bar.ref.002.txt")), "Foo runs things in a working directory.");
    assert!(dir.join("Bar.Generated.rs").exists());

    let file = report.outcomes[0].result.as_ref().unwrap();
    assert!(file.references[1].failed());
    assert_eq!(read(ws.defs().join("Bar.json")), description);
}

#[tokio::test]
async fn test_failed_file_does_not_block_others() {
    let ws = Workspace::new(&[
        ("A.json", "{ \"Tasks\": [] }"),
        ("Foo.json", FOO_CANONICAL),
        ("notes.txt", "not a description"),
    ]);
    let report = ws.run(doc_fetcher()).await;

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[0].result.is_err());
    assert!(report.outcomes[1].is_ok());
    assert!(report.has_failures());
    assert!(ws.out().join("Foo").join("Foo.Generated.rs").exists());
}

#[tokio::test]
async fn test_dry_run_reports_plan_and_touches_nothing() {
    let ws = Workspace::new(&[("Foo.json", FOO)]);
    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = ws
        .driver(doc_fetcher(), options)
        .run(&ws.defs(), &NoProgress)
        .await
        .unwrap();

    let file = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(file.generated.path, ws.out().join("Foo").join("Foo.Generated.rs"));
    assert_eq!(file.references[0].path, ws.out().join("Foo").join("Foo.ref.000.txt"));
    assert_eq!(file.saved.path, ws.defs().join("Foo.json.new"));
    assert!(!file.saved.written);

    assert!(!ws.out().exists());
    assert!(!ws.defs().join("Foo.json.new").exists());
    assert_eq!(read(ws.defs().join("Foo.json")), FOO);
}
