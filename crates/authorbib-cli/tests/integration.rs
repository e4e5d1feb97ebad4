//! Integration tests for the authorbib CLI
//!
//! These run the built binary against temporary config files. Deployment
//! variables are cleared so the host environment cannot leak in.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const DEPLOYMENT_VARS: &[&str] = &[
    "WP_UPLOADS_PATH",
    "SITE_ID",
    "BIB_ROOT",
    "PERMALINK_DIR",
    "HISTORY_DIR",
    "ZOTERO_API_KEY",
];

const CONFIG: &str = r#"
[general]
citation_style = "chicago-author-date"
locale = "de-DE"

[zotero]
group_id = "4711"
collection_key = "COLL1234"
# Nothing listens here
api_url = "http://127.0.0.1:9"
timeout_secs = 2

[deployment]
bib_root = "bibliographies"
permalink_dir = "permalink"
history_dir = "history"

[[authors]]
slug = "anna-mueller"
name = "Anna Müller"
identifiers = ["Anna Müller"]

[[authors]]
slug = "john-doe"
identifiers = ["John Doe"]
"#;

fn authorbib(dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_authorbib"));
    cmd.current_dir(dir).args(args).env("RUST_LOG", "warn");
    for var in DEPLOYMENT_VARS {
        cmd.env_remove(var);
    }
    cmd.output().expect("failed to run authorbib")
}

fn write_config(dir: &TempDir, content: &str) {
    fs::write(dir.path().join("authorbib.toml"), content).unwrap();
}

#[test]
fn test_check_prints_permalink_paths() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, CONFIG);
    let uploads = dir.path().join("uploads");
    let uploads_arg = uploads.to_str().unwrap();

    let output = authorbib(
        dir.path(),
        &["--uploads-path", uploads_arg, "--site-id", "3", "check"],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Authors (2):"));
    assert!(stdout.contains("anna-mueller [Anna Müller]"));
    assert!(stdout.contains("john-doe [John Doe]"));
    assert!(stdout.contains(
        "http://127.0.0.1:9/groups/4711/collections/COLL1234/items"
    ));

    let expected = uploads
        .join("sites/3/bibliographies/permalink/anna-mueller/anna-mueller.pdf");
    assert!(stdout.contains(&expected.display().to_string()));
    assert!(stdout.contains("Configuration OK"));

    // check never writes
    assert!(!uploads.exists());
}

#[test]
fn test_check_reads_deployment_from_environment() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, CONFIG);

    let output = Command::new(env!("CARGO_BIN_EXE_authorbib"))
        .current_dir(dir.path())
        .arg("check")
        .env("WP_UPLOADS_PATH", dir.path().join("wp"))
        .env("SITE_ID", "7")
        .env_remove("BIB_ROOT")
        .env_remove("PERMALINK_DIR")
        .env_remove("HISTORY_DIR")
        .env_remove("ZOTERO_API_KEY")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("sites{}7", std::path::MAIN_SEPARATOR)));
    assert!(stdout.contains("API key: none"));
}

#[test]
fn test_missing_deployment_value_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, CONFIG);

    // No uploads path and no site id anywhere
    let output = authorbib(dir.path(), &["check"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid configuration"));
}

#[test]
fn test_invalid_author_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = CONFIG.replace("slug = \"john-doe\"", "slug = \"../john\"");
    write_config(&dir, &config);

    let output = authorbib(
        dir.path(),
        &["--uploads-path", "/tmp/unused", "--site-id", "3", "check"],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_config_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let output = authorbib(dir.path(), &["--config", "nope.toml", "check"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.toml"));
}

#[test]
fn test_unreachable_source_aborts_generate() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, CONFIG);
    let uploads = dir.path().join("uploads");

    let output = authorbib(
        dir.path(),
        &[
            "--uploads-path",
            uploads.to_str().unwrap(),
            "--site-id",
            "3",
            "generate",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Fetching library items failed"));
    assert!(!uploads.join("sites/3/bibliographies/permalink").exists());
}

#[test]
fn test_unreachable_source_aborts_match() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, CONFIG);

    let output = authorbib(
        dir.path(),
        &[
            "--uploads-path",
            "/tmp/unused",
            "--site-id",
            "3",
            "match",
            "--format",
            "json",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_log_file_is_appended() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.log");
    let config = CONFIG.replace(
        "locale = \"de-DE\"",
        &format!("locale = \"de-DE\"\nlog_file = {:?}", log.to_str().unwrap()),
    );
    write_config(&dir, &config);
    fs::write(&log, "previous run\n").unwrap();

    let output = authorbib(dir.path(), &["check"]);
    assert_eq!(output.status.code(), Some(2));

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.starts_with("previous run\n"));
    assert!(content.contains("Invalid configuration"));
}
