//! Output path resolution
//!
//! Layout of the output tree:
//!
//! ```text
//! {uploads}/sites/{site_id}/{bib_root}/{permalink_dir}/{slug}/{filename_template}
//! {uploads}/sites/{site_id}/{bib_root}/{history_dir}/{slug}/{history_filename_template}
//! ```
//!
//! Resolution is pure: it never touches the filesystem. Directory creation
//! belongs to the writer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::ConfigError;

/// Timestamp format for history filenames; lexical order is chronological
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Default permalink filename
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{slug}.pdf";

/// Default history filename
pub const DEFAULT_HISTORY_FILENAME_TEMPLATE: &str = "{slug}-{timestamp}.pdf";

/// Format a generation time for use in filenames
pub fn format_timestamp(now: &DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("valid placeholder regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slug,
    Timestamp,
}

/// A parsed filename template such as `{slug}-{timestamp}.pdf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    /// Parse a template, accepting only `{slug}` and `{timestamp}`
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if template.trim().is_empty() {
            return Err(invalid("template is empty"));
        }
        if template.contains(['/', '\\']) {
            return Err(invalid("template must not contain path separators"));
        }
        if template.starts_with('.') {
            return Err(invalid("template must not start with '.'"));
        }

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_literal(&mut segments, &template[last..whole.start()]);
            match &caps[1] {
                "slug" => segments.push(Segment::Slug),
                "timestamp" => segments.push(Segment::Timestamp),
                other => {
                    return Err(invalid(&format!("unknown placeholder {{{}}}", other)));
                }
            }
            last = whole.end();
        }
        push_literal(&mut segments, &template[last..]);

        let stray_brace = segments.iter().any(|s| match s {
            Segment::Literal(text) => text.contains(['{', '}']),
            _ => false,
        });
        if stray_brace {
            return Err(invalid("unbalanced brace"));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Whether the template includes `{timestamp}`
    pub fn has_timestamp(&self) -> bool {
        self.segments.contains(&Segment::Timestamp)
    }

    /// Template text as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute placeholders; `{timestamp}` renders empty when `timestamp` is None
    pub fn render(&self, slug: &str, timestamp: Option<&str>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slug => out.push_str(slug),
                Segment::Timestamp => out.push_str(timestamp.unwrap_or_default()),
            }
        }
        out
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
}

/// Deployment values that determine where files land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub uploads_path: PathBuf,
    pub site_id: String,
    pub bib_root: String,
    pub permalink_dir: String,
    pub history_dir: String,
    pub filename: FilenameTemplate,
    pub history_filename: FilenameTemplate,
    /// Write timestamped history copies
    pub history: bool,
}

/// Where one author's PDF is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub permalink_path: PathBuf,
    pub history_path: Option<PathBuf>,
}

/// Maps author slugs to output paths
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    layout: &'a OutputLayout,
}

impl<'a> PathResolver<'a> {
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self { layout }
    }

    /// `{uploads}/sites/{site_id}/{bib_root}`
    pub fn bibliography_root(&self) -> PathBuf {
        self.layout
            .uploads_path
            .join("sites")
            .join(&self.layout.site_id)
            .join(&self.layout.bib_root)
    }

    /// Stable path of the always-current PDF
    pub fn permalink_path(&self, slug: &str) -> PathBuf {
        self.author_dir(&self.layout.permalink_dir, slug)
            .join(self.layout.filename.render(slug, None))
    }

    /// Timestamp-qualified archive path
    pub fn history_path(&self, slug: &str, now: &DateTime<Utc>) -> PathBuf {
        let stamp = format_timestamp(now);
        self.author_dir(&self.layout.history_dir, slug)
            .join(self.layout.history_filename.render(slug, Some(&stamp)))
    }

    /// Both targets; the history path only when history is enabled and a time is given
    pub fn resolve(&self, slug: &str, now: Option<&DateTime<Utc>>) -> OutputTarget {
        let history_path = match now {
            Some(now) if self.layout.history => Some(self.history_path(slug, now)),
            _ => None,
        };
        OutputTarget {
            permalink_path: self.permalink_path(slug),
            history_path,
        }
    }

    fn author_dir(&self, kind: &str, slug: &str) -> PathBuf {
        self.bibliography_root().join(kind).join(slug)
    }
}

/// Helper for logs: path relative to the uploads directory when possible
pub fn display_relative<'p>(layout: &OutputLayout, path: &'p Path) -> std::path::Display<'p> {
    path.strip_prefix(&layout.uploads_path)
        .unwrap_or(path)
        .display()
}
