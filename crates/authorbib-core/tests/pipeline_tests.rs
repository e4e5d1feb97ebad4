//! Integration tests for the generation pipeline
//!
//! The source and renderer are in-memory fakes; the writer works against a
//! temporary uploads directory.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use authorbib_core::{
    BibliographicItem, BibliographyRenderer, Config, Creator, DeploymentOverrides, FetchQuery,
    HistoryStatus, ItemSource, Pipeline, RenderError, RenderRequest, Role, Settings, SourceError,
};

const SETTINGS: &str = r#"
[general]
citation_style = "chicago-author-date"
locale = "de-DE"

[zotero]
group_id = "4711"
collection_key = "COLL"

[deployment]
site_id = "3"
bib_root = "bibliographies"
permalink_dir = "permalink"
history_dir = "history"

[[authors]]
slug = "anna-mueller"
identifiers = ["Anna Müller", "A. Mueller"]

[[authors]]
slug = "john-doe"
identifiers = ["John Doe"]

[[authors]]
slug = "jane-roe"
identifiers = ["Jane Roe"]
"#;

fn config(uploads: &Path, history: bool) -> Config {
    let overrides = DeploymentOverrides {
        uploads_path: Some(uploads.to_path_buf()),
        no_history: !history,
        ..Default::default()
    };
    Settings::from_toml_str(SETTINGS)
        .unwrap()
        .into_config(&overrides)
        .unwrap()
}

fn item(key: &str, creators: Vec<Creator>) -> BibliographicItem {
    BibliographicItem {
        key: key.to_string(),
        title: Some(format!("Title {}", key)),
        item_type: Some("book".to_string()),
        citation_text: format!("Citation {}", key),
        creators,
    }
}

fn library() -> Vec<BibliographicItem> {
    vec![
        item("ITEM1", vec![Creator::author("Anna Müller")]),
        item(
            "ITEM2",
            vec![Creator::author("A. Mueller"), Creator::author("John Doe")],
        ),
        item("ITEM3", vec![Creator::new("Jane Roe", Role::Editor)]),
    ]
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
}

struct FakeSource {
    items: Vec<BibliographicItem>,
    seen: RefCell<Vec<String>>,
}

impl FakeSource {
    fn new(items: Vec<BibliographicItem>) -> Self {
        Self {
            items,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ItemSource for FakeSource {
    fn fetch_all(&self, query: &FetchQuery<'_>) -> Result<Vec<BibliographicItem>, SourceError> {
        self.seen.borrow_mut().push(format!(
            "{}|{}|{}",
            query.collection_key.unwrap_or("-"),
            query.citation_style,
            query.locale
        ));
        Ok(self.items.clone())
    }
}

struct DownSource;

impl ItemSource for DownSource {
    fn fetch_all(&self, _query: &FetchQuery<'_>) -> Result<Vec<BibliographicItem>, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

/// Writes "slug: citation; citation" and fails for selected slugs
#[derive(Default)]
struct FakeRenderer {
    fail_for: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl BibliographyRenderer for FakeRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
        let slug = request.author.slug.as_str();
        self.calls.borrow_mut().push(slug.to_string());
        if self.fail_for.iter().any(|f| *f == slug) {
            return Err(RenderError(format!("cannot render {}", slug)));
        }
        let body = format!("{}: {}", slug, request.bibliography.citations().join("; "));
        Ok(body.into_bytes())
    }
}

fn permalink(root: &Path, slug: &str) -> std::path::PathBuf {
    root.join("sites/3/bibliographies/permalink")
        .join(slug)
        .join(format!("{}.pdf", slug))
}

#[test]
fn test_example_scenario_writes_expected_files() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);
    let source = FakeSource::new(library());
    let renderer = FakeRenderer::default();

    let report = Pipeline::new(&config)
        .run_at(&source, &renderer, noon())
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.fetched, 3);
    assert_eq!(
        source.seen.borrow().as_slice(),
        ["COLL|chicago-author-date|de-DE"]
    );

    assert_eq!(
        fs::read_to_string(permalink(tmp.path(), "anna-mueller")).unwrap(),
        "anna-mueller: Citation ITEM1; Citation ITEM2"
    );
    assert_eq!(
        fs::read_to_string(permalink(tmp.path(), "john-doe")).unwrap(),
        "john-doe: Citation ITEM2"
    );

    let history = tmp
        .path()
        .join("sites/3/bibliographies/history/anna-mueller/anna-mueller-20240517-120000.pdf");
    assert!(history.is_file());
    assert!(matches!(
        report.outcome("anna-mueller").unwrap().history,
        HistoryStatus::Written(ref p) if p == &history
    ));
}

#[test]
fn test_zero_matches_still_renders() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), false);
    let source = FakeSource::new(library());
    let renderer = FakeRenderer::default();

    let report = Pipeline::new(&config)
        .run_at(&source, &renderer, noon())
        .unwrap();

    let jane = report.outcome("jane-roe").unwrap();
    assert_eq!(jane.matched, 0);
    assert!(jane.is_success());
    assert!(matches!(jane.history, HistoryStatus::Disabled));
    assert_eq!(
        fs::read_to_string(permalink(tmp.path(), "jane-roe")).unwrap(),
        "jane-roe: "
    );
    assert_eq!(
        renderer.calls.borrow().as_slice(),
        ["anna-mueller", "john-doe", "jane-roe"]
    );
}

#[test]
fn test_render_failure_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);
    let source = FakeSource::new(library());
    let renderer = FakeRenderer {
        fail_for: vec!["john-doe"],
        ..Default::default()
    };

    let report = Pipeline::new(&config)
        .run_at(&source, &renderer, noon())
        .unwrap();

    assert!(!report.is_success());
    let failed: Vec<_> = report.failed().map(|o| o.slug.as_str()).collect();
    assert_eq!(failed, vec!["john-doe"]);

    assert!(permalink(tmp.path(), "anna-mueller").is_file());
    assert!(permalink(tmp.path(), "jane-roe").is_file());
    assert!(!permalink(tmp.path(), "john-doe").exists());

    let john = report.outcome("john-doe").unwrap();
    assert_eq!(john.error.as_ref().unwrap().stage(), "render");
    assert!(matches!(john.history, HistoryStatus::Skipped));
}

#[test]
fn test_write_failure_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), false);

    // A regular file where john-doe's permalink directory should go
    let blocked = tmp.path().join("sites/3/bibliographies/permalink");
    fs::create_dir_all(&blocked).unwrap();
    fs::write(blocked.join("john-doe"), b"not a directory").unwrap();

    let report = Pipeline::new(&config)
        .run_at(&FakeSource::new(library()), &FakeRenderer::default(), noon())
        .unwrap();

    let john = report.outcome("john-doe").unwrap();
    assert_eq!(john.error.as_ref().unwrap().stage(), "write");
    assert!(report.outcome("anna-mueller").unwrap().is_success());
    assert!(report.outcome("jane-roe").unwrap().is_success());
}

#[test]
fn test_same_second_rerun_collides_on_history_only() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);
    let pipeline = Pipeline::new(&config);

    pipeline
        .run_at(&FakeSource::new(library()), &FakeRenderer::default(), noon())
        .unwrap();

    let mut changed = library();
    changed.push(item("ITEM4", vec![Creator::author("John Doe")]));
    let report = pipeline
        .run_at(&FakeSource::new(changed), &FakeRenderer::default(), noon())
        .unwrap();

    // collisions are warnings; the permalink still carries the new content
    assert!(report.is_success());
    assert!(matches!(
        report.outcome("john-doe").unwrap().history,
        HistoryStatus::Collision(_)
    ));
    assert_eq!(
        fs::read_to_string(permalink(tmp.path(), "john-doe")).unwrap(),
        "john-doe: Citation ITEM2; Citation ITEM4"
    );
}

#[test]
fn test_history_accumulates_across_runs() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);
    let pipeline = Pipeline::new(&config);
    let later = Utc.with_ymd_and_hms(2024, 5, 18, 6, 30, 0).unwrap();

    for now in [noon(), later] {
        pipeline
            .run_at(&FakeSource::new(library()), &FakeRenderer::default(), now)
            .unwrap();
    }

    let dir = tmp.path().join("sites/3/bibliographies/history/john-doe");
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["john-doe-20240517-120000.pdf", "john-doe-20240518-063000.pdf"]
    );
}

#[test]
fn test_source_failure_aborts_before_rendering() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);
    let renderer = FakeRenderer::default();

    let err = Pipeline::new(&config)
        .run_at(&DownSource, &renderer, noon())
        .unwrap_err();

    assert!(matches!(err, SourceError::Unavailable(_)));
    assert!(renderer.calls.borrow().is_empty());
    assert!(!tmp.path().join("sites").exists());
}

#[test]
fn test_preview_counts() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path(), true);

    let summary = Pipeline::new(&config)
        .preview(&FakeSource::new(library()))
        .unwrap();

    assert_eq!(summary.total_items, 3);
    assert_eq!(summary.authors_with_items, 2);
    assert_eq!(summary.unmatched_items, 1);
    assert_eq!(summary.per_author["anna-mueller"], 2);
    assert!(!tmp.path().join("sites").exists());
}
